fn main() {
    if let Err(err) = wax_advisor::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
