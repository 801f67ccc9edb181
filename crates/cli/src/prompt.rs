//! Interactive correction prompt.
//!
//! Asks the operator for a replacement measurement whenever the resolver
//! runs out of table lookups. Reads one line per answer; `skip` (any case)
//! gives up on the SKU, end of input defers it.

use std::io::{BufRead, Write};

use reprice_recon::{Correction, CorrectionRequest, CorrectionSource};

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Option<String> {
        loop {
            write!(self.output, "Enter new measurements (e.g., 300-48) or type 'skip': ").ok()?;
            self.output.flush().ok()?;

            let mut buf = String::new();
            match self.input.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let answer = buf.trim();
                    if !answer.is_empty() {
                        return Some(answer.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot read correction");
                    return None;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> CorrectionSource for TerminalPrompt<R, W> {
    fn request(&mut self, request: &CorrectionRequest<'_>) -> Correction {
        let notice = match request.rejected {
            None => writeln!(self.output, "SKU {} not found in new prices file.", request.sku),
            Some(rejected) => writeln!(
                self.output,
                "Invalid measurements '{rejected}' (no price for {}). Try again.",
                request.sku.key_with(request.color, rejected)
            ),
        };
        if notice.is_err() {
            return Correction::Defer;
        }

        match self.read_answer() {
            None => Correction::Defer,
            Some(answer) if answer.eq_ignore_ascii_case("skip") => Correction::Skip,
            Some(answer) => Correction::Replace(answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reprice_recon::sku::SkuParser;

    fn ask(input: &str, rejected: Option<&str>) -> (Correction, String) {
        let sku = SkuParser::new("KBS").parse("KBS-200-NAT-7-7").unwrap();
        let request = CorrectionRequest {
            sku: &sku,
            color: "SCH",
            measurement_key: "7-7",
            attempt: 1,
            rejected,
        };
        let mut out = Vec::new();
        let answer = TerminalPrompt::new(input.as_bytes(), &mut out).request(&request);
        (answer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn replacement_is_trimmed() {
        let (answer, out) = ask("  7-8 \n", None);
        assert_eq!(answer, Correction::Replace("7-8".into()));
        assert!(out.starts_with("SKU KBS-200-NAT-7-7 not found in new prices file.\n"));
    }

    #[test]
    fn skip_any_case() {
        assert_eq!(ask("SKIP\n", None).0, Correction::Skip);
        assert_eq!(ask("Skip\n", None).0, Correction::Skip);
    }

    #[test]
    fn blank_lines_ask_again() {
        let (answer, out) = ask("\n\n300-48\n", None);
        assert_eq!(answer, Correction::Replace("300-48".into()));
        assert_eq!(out.matches("Enter new measurements").count(), 3);
    }

    #[test]
    fn end_of_input_defers() {
        assert_eq!(ask("", None).0, Correction::Defer);
    }

    #[test]
    fn rejected_answer_is_reported() {
        let (_, out) = ask("skip\n", Some("1-1"));
        assert!(out.starts_with("Invalid measurements '1-1' (no price for KBS-200-SCH-1-1). Try again.\n"));
    }
}
