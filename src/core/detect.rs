use crate::core::parse::xml_well_formed;
use crate::domain::model::{DetectedFormat, InputFormat};

/// Guesses the serialization format of raw text. Pure and infallible; the
/// worst case is `Unknown`.
///
/// Ordering is a deliberate tie-break: structural bracket/angle-bracket checks
/// win over delimiter counting, because the CSV/TSV heuristic is the weakest
/// signal (a JSON array of numbers contains commas too). Every structural
/// guess is confirmed by an actual parse before it is trusted.
pub fn detect_format(text: &str) -> DetectedFormat {
    let trimmed = text.trim();

    if (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'))
    {
        if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
            return DetectedFormat::Format(InputFormat::Json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') && xml_well_formed(trimmed) {
        return DetectedFormat::Format(InputFormat::Xml);
    }

    // Colon/comma ratio heuristic carried over from the original tool. It can
    // flag prose or INI-like text, which is why the guess is only kept when a
    // real YAML parse succeeds.
    let colons = trimmed.matches(':').count();
    let commas = trimmed.matches(',').count();
    let looks_like_yaml = (trimmed.contains("- ") && trimmed.contains(':'))
        || (colons > commas && trimmed.contains('\n'));
    if looks_like_yaml && serde_yaml::from_str::<serde_yaml::Value>(trimmed).is_ok() {
        return DetectedFormat::Format(InputFormat::Yaml);
    }

    let mut lines = trimmed.split('\n');
    let first_line = lines.next().unwrap_or_default();
    if lines.next().is_some() {
        let tabs = first_line.matches('\t').count();
        let commas = first_line.matches(',').count();
        if tabs > commas && tabs > 0 {
            return DetectedFormat::Format(InputFormat::Tsv);
        }
        if commas > 0 {
            return DetectedFormat::Format(InputFormat::Csv);
        }
    }

    DetectedFormat::Unknown
}
