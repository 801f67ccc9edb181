// Delimited price files: old exports, new price lists, reports

use std::io::Read;
use std::path::Path;

use reprice_recon::{NewPriceFormat, OldExport, PriceTable, ReconError};

/// Load the old export (metadata line, header line, semicolon rows).
pub fn read_old_export(path: &Path) -> Result<OldExport, ReconError> {
    let content = read_file_as_utf8(path)?;
    OldExport::parse(&path.display().to_string(), &content)
}

/// Load a new price list. Without an explicit format the delimiter decides:
/// semicolons mean the positional `Price;Shipping;Cost;SKU` layout, commas the
/// keyed `SKU,Price` layout.
pub fn read_price_table(path: &Path, format: Option<NewPriceFormat>) -> Result<PriceTable, ReconError> {
    let content = read_file_as_utf8(path)?;
    let format = format.unwrap_or_else(|| NewPriceFormat::from_delimiter(sniff_delimiter(&content)));
    tracing::debug!(path = %path.display(), %format, "reading price list");
    PriceTable::load(&path.display().to_string(), &content, format)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by its field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (price exports often come out of Excel as Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| io_err(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            tracing::debug!(path = %path.display(), "not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Write text, creating parent directories as needed.
pub fn write_text(path: &Path, content: &str) -> Result<(), ReconError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    std::fs::write(path, content).map_err(|e| io_err(path, e))
}

pub(crate) fn io_err(path: &Path, e: std::io::Error) -> ReconError {
    ReconError::Io(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Preis;Versand;EK;SKU\n\"12,90 €\";\"4,90 €\";\"6,10 €\";KBS-200-SCH-10-20\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "SKU,Price\nKBS-200-SCH-10-20,\"10,50€\"\nKBS-500-SCH-10-20,25\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_empty_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        // 0x80 is the Euro sign in Windows-1252
        fs::write(&path, b"SKU,Price\nKBS-200-SCH-10-20,\"10,50\x80\"\n").unwrap();

        let text = read_file_as_utf8(&path).unwrap();
        assert!(text.contains("10,50€"));

        let table = read_price_table(&path, None).unwrap();
        assert_eq!(table.price("KBS-200-SCH-10-20"), Some(1050));
    }

    #[test]
    fn test_positional_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.csv");
        fs::write(&path, "Preis;Versand;EK;SKU\n\"12,90 €\";\"4,90 €\";\"6,10 €\";KBS-200-SCH-10-20\n").unwrap();

        let table = read_price_table(&path, None).unwrap();
        let entry = table.get("KBS-200-SCH-10-20").unwrap();
        assert_eq!(entry.cost_cents, Some(610));
    }

    #[test]
    fn test_explicit_format_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.csv");
        fs::write(&path, "SKU,Price\nA,1\n").unwrap();
        let table = read_price_table(&path, Some(NewPriceFormat::Positional)).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_old_export(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }

    #[test]
    fn test_write_text_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("export.csv");
        write_text(&path, "meta\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "meta\n");
    }
}
