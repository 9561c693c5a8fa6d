use serde_json::Value;

use twins_core::classification::domain::batch_summary::BatchSummary;
use twins_core::classification::domain::image_analysis::ImageAnalysis;
use twins_core::pipeline::classify_batch_use_case::ProgressEvent;

use crate::labels::{display_label, Lang};

/// JSON array of analyses. Japanese output also carries `label_ja` next to
/// each canonical label.
pub fn render_json(results: &[ImageAnalysis], lang: Lang, pretty: bool) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(results)?;
    if lang == Lang::Ja {
        if let Some(items) = value.as_array_mut() {
            for (item, analysis) in items.iter_mut().zip(results) {
                if let Some(cls) = item.get_mut("classification").and_then(Value::as_object_mut) {
                    let label = display_label(analysis.classification().label, Lang::Ja);
                    cls.insert("label_ja".into(), Value::from(label));
                }
            }
        }
    }
    if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
}

/// One tab-separated line per image: `label  distance  faces  path`.
pub fn render_brief(results: &[ImageAnalysis], lang: Lang) -> String {
    results
        .iter()
        .map(|analysis| {
            let cls = analysis.classification();
            format!(
                "{}\t{}\t{}\t{}",
                display_label(cls.label, lang),
                format_distance(cls.distance),
                analysis.faces().len(),
                analysis.path().display()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(summary: &BatchSummary, lang: Lang) -> String {
    let mut lines = vec!["# summary".to_string()];
    for (&label, &count) in &summary.counts {
        lines.push(format!(
            "{}: {count} ({:.1}%)",
            display_label(label, lang),
            summary.share(label)
        ));
    }
    if let Some(mean) = summary.mean_distance {
        lines.push(format!("mean_distance: {mean:.3}"));
    }
    if let Some(median) = summary.median_distance {
        lines.push(format!("median_distance: {median:.3}"));
    }
    lines.join("\n")
}

pub fn render_progress(event: &ProgressEvent, lang: Lang) -> String {
    let status = match (&event.error, event.label) {
        (Some(error), _) => format!("error: {error}"),
        (None, Some(label)) => format!(
            "{} {}",
            display_label(label, lang),
            format_distance(event.distance)
        ),
        (None, None) => "-".to_string(),
    };
    format!(
        "[{}/{} {:3}%] {}: {status}",
        event.index, event.total, event.percent, event.filename
    )
}

fn format_distance(distance: Option<f64>) -> String {
    distance.map_or_else(|| "-".to_string(), |d| format!("{d:.3}"))
}
