#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Header row of the survey form export, in positional order.
pub const SURVEY_HEADER: &str = "Zeitstempel,Streckenabschnitt,Lufttemperatur (°C),Schneetyp,Schneefeuchte,Wachsmarke,Wachsprodukt,Bewertung (1-5),Schneetemperatur (°C),Anzahl Schichten";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a survey export with the given data lines under the form header.
    pub fn write_survey(&self, name: &str, lines: &[&str]) -> PathBuf {
        let mut contents = String::from(SURVEY_HEADER);
        contents.push('\n');
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        self.write(name, &contents)
    }
}

/// A small export covering two locations and several products.
pub fn sample_survey_lines() -> Vec<&'static str> {
    vec![
        "12.01.2025 08:01:00, Möserer Steig ,-4,Neuschnee kalt,Trocken,Swix,V40,5,-7,2",
        "12.01.2025 08:15:00,Möserer Steig,-3,Neuschnee kalt,Trocken,Swix,V40,4,-6,3",
        "12.01.2025 09:02:00,Möserer Steig,-5,Neuschnee kalt,Trocken,Rode,P40,3,,1",
        "13.01.2025 10:20:00,Möserer Steig,-4,Neuschnee kalt,Trocken,Start,Grip Green,,,",
        "13.01.2025 10:45:00,Möserer Steig,1,Nassschnee,Nass,Swix,K22,4,0,1",
        "14.01.2025 11:05:00,Wildmoos,-10,Kunstschnee,Normal,Holmenkol,Ultra Mix,2,-12,2",
        "14.01.2025 11:30:00,Wildmoos,kalt,Pulverschnee,Normal,Holmenkol,Ultra Mix,gut,,zwei",
    ]
}
