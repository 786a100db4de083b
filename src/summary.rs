use std::fmt::Write;

use serde_derive::Serialize;
use serde_with::{serde_as, DisplayFromStr};

use crate::timestamp::Timestamp;

/// Final outcome of a run, printed on success and on failure alike.
#[serde_as]
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Report {
    /// When the start timer fired; zero if it never did.
    #[serde_as(as = "DisplayFromStr")]
    pub start: Timestamp,
    pub peer_count: usize,
    pub pongs_sent: usize,
    pub pongs_recvd: usize,
    /// Round-trip seconds per peer, in peer-index order.
    pub round_trips: Vec<f64>,
}

impl Report {
    pub fn as_text(&self) -> Result<String, std::fmt::Error> {
        let mut result = String::new();
        writeln!(&mut result, "{}", self.start)?;
        for round_trip in &self.round_trips {
            writeln!(&mut result, "{:.6}", round_trip)?;
        }
        Ok(result)
    }

    pub fn as_json(&self) -> Result<String, serde_json::Error> {
        let mut result = serde_json::to_string(self)?;
        result.push('\n');
        Ok(result)
    }

    pub fn as_csv(&self) -> Result<String, std::fmt::Error> {
        let mut result = String::new();
        write!(&mut result, "{}", self.start)?;
        for round_trip in &self.round_trips {
            write!(&mut result, ",{:.6}", round_trip)?;
        }
        writeln!(result)?;
        Ok(result)
    }
}
