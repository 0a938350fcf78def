use crate::data::model::{format_mass, TargetMass};
use crate::errors::ConfigurationError;

/// Parse a mass list: one target per line, `mass` or `mass=label`.
///
/// Blank lines are skipped. Only the first `=` separates mass from label, so
/// labels may contain `=` themselves. Every target gets `half_window`.
pub fn parse_mass_list(
    text: &str,
    half_window: f64,
) -> Result<Vec<TargetMass>, ConfigurationError> {
    if !(half_window.is_finite() && half_window > 0.0) {
        return Err(ConfigurationError::NonPositiveWindow(half_window));
    }

    let mut targets = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (mass_text, label) = match line.split_once('=') {
            Some((mass, label)) => (mass.trim(), label.trim()),
            None => (line, ""),
        };

        let malformed = |reason: String| ConfigurationError::MalformedMassLine {
            line: i + 1,
            content: raw.to_string(),
            reason,
        };
        let mass = mass_text
            .parse::<f64>()
            .map_err(|e| malformed(format!("'{mass_text}' is not a number ({e})")))?;
        if !(mass.is_finite() && mass > 0.0) {
            return Err(malformed(format!("mass must be positive, got {mass}")));
        }

        targets.push(TargetMass::new(mass, label, half_window));
    }
    Ok(targets)
}

/// Write targets back in the format [`parse_mass_list`] reads.
pub fn format_mass_list(targets: &[TargetMass]) -> String {
    let mut out = String::new();
    for target in targets {
        out.push_str(&format_mass(target.mass));
        if !target.label.is_empty() {
            out.push('=');
            out.push_str(&target.label);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_masses_and_labels() {
        let text = "  100.0 \n\n255.2331 = palmitate\r\n  \n301.1=a=b\n";
        let targets = parse_mass_list(text, 0.02).unwrap();
        assert_eq!(
            targets,
            vec![
                TargetMass::new(100.0, "", 0.02),
                TargetMass::new(255.2331, "palmitate", 0.02),
                TargetMass::new(301.1, "a=b", 0.02),
            ]
        );
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let targets = parse_mass_list("200.0\n100.0\n200.0=again", 0.1).unwrap();
        let masses: Vec<f64> = targets.iter().map(|t| t.mass).collect();
        assert_eq!(masses, vec![200.0, 100.0, 200.0]);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_mass_list("100.0\n\nabc\n", 0.02).unwrap_err();
        match err {
            ConfigurationError::MalformedMassLine { line, content, .. } => {
                assert_eq!(line, 3);
                assert_eq!(content, "abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_mass_and_window() {
        assert!(matches!(
            parse_mass_list("-5.0=neg", 0.02),
            Err(ConfigurationError::MalformedMassLine { line: 1, .. })
        ));
        assert!(matches!(
            parse_mass_list("nan", 0.02),
            Err(ConfigurationError::MalformedMassLine { .. })
        ));
        assert!(matches!(
            parse_mass_list("100.0", 0.0),
            Err(ConfigurationError::NonPositiveWindow(_))
        ));
    }

    #[test]
    fn format_reads_back() {
        let targets = vec![
            TargetMass::new(100.0, "", 0.05),
            TargetMass::new(255.2331, "palmitate", 0.05),
        ];
        let text = format_mass_list(&targets);
        assert_eq!(text, "100.0\n255.2331=palmitate\n");
        assert_eq!(parse_mass_list(&text, 0.05).unwrap(), targets);
    }
}
