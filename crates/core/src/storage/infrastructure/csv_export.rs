use std::io::{self, Write};

use crate::classification::domain::image_analysis::ImageAnalysis;

pub const CSV_HEADER: [&str; 5] = ["file", "label", "distance", "faces", "abs_path"];

/// Writes one row per analysis under the `file,label,distance,faces,abs_path`
/// header. Distance is rounded to 3 decimals, empty when absent.
pub fn write_csv<W: Write>(mut out: W, results: &[ImageAnalysis]) -> io::Result<()> {
    write_row(&mut out, &CSV_HEADER)?;
    for analysis in results {
        let classification = analysis.classification();
        let distance = classification
            .distance
            .map(|d| format!("{d:.3}"))
            .unwrap_or_default();
        let file = analysis.file_name();
        let faces = analysis.faces().len().to_string();
        let abs_path = analysis.path().to_string_lossy();
        write_row(
            &mut out,
            &[
                file.as_str(),
                classification.label.as_str(),
                distance.as_str(),
                faces.as_str(),
                abs_path.as_ref(),
            ],
        )?;
    }
    out.flush()
}

fn write_row<W: Write>(out: &mut W, fields: &[&str]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape(f))
        .collect::<Vec<_>>()
        .join(",");
    out.write_all(line.as_bytes())?;
    out.write_all(b"\r\n")
}

/// RFC 4180 quoting: fields containing a comma, quote or line break are
/// wrapped in quotes with inner quotes doubled.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
