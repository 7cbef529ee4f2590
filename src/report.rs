use std::io;

use serde::Serialize;

use crate::verifier::VerificationReport;

#[derive(Debug, Serialize)]
struct TallyRow<'a> {
    endpoint: &'a str,
    dispatched: u64,
    accepted: u64,
    rejected: u64,
    failed: u64,
}

/// Write per-endpoint request tallies in csv format
pub fn write_report(report: &VerificationReport, out: impl io::Write) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    for tally in &report.endpoints {
        writer.serialize(TallyRow {
            endpoint: &tally.endpoint,
            dispatched: tally.dispatched,
            accepted: tally.accepted,
            rejected: tally.rejected,
            failed: tally.failed,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Same as [`write_report`], to stdout.
pub fn print_report(report: &VerificationReport) -> Result<(), csv::Error> {
    let stdout = io::stdout();
    write_report(report, stdout.lock())
}
