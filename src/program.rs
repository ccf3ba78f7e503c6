use std::fs;
use std::path::Path;

use anyhow::Context;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("line {line}: `{text}` is not a 32-bit hex word")]
    InvalidWord { line: usize, text: String },
}

/// Parses one hex word per line. `#` starts a comment, blank lines are
/// skipped and the `0x` prefix is optional.
pub fn parse_words(source: &str) -> Result<Vec<u32>, ProgramError> {
    let mut words = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let text = line.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        let word = u32::from_str_radix(digits, 16).map_err(|_| ProgramError::InvalidWord {
            line: idx + 1,
            text: String::from(text),
        })?;
        words.push(word);
    }
    Ok(words)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<u32>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read program {}", path.display()))?;
    let words = parse_words(&source)
        .with_context(|| format!("failed to parse program {}", path.display()))?;
    tracing::debug!("read {} words from {}", words.len(), path.display());
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_words_comments_and_blanks() {
        let source = "\
# add then addi
0x014B4820
2009ffff   # addi $t1, $zero, -1

0X0810_0004
";
        assert_eq!(
            parse_words(source),
            Err(ProgramError::InvalidWord {
                line: 5,
                text: String::from("0X0810_0004")
            })
        );

        let source = source.replace("0810_0004", "08100004");
        assert_eq!(
            parse_words(&source).unwrap(),
            vec![0x014B_4820, 0x2009_FFFF, 0x0810_0004]
        );
    }

    #[test]
    fn rejects_words_wider_than_32_bits() {
        assert!(matches!(
            parse_words("0x1_0000_0000"),
            Err(ProgramError::InvalidWord { line: 1, .. })
        ));
        assert!(parse_words("123456789").is_err());
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        assert_eq!(parse_words("\n# nothing\n   \n").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn sample_shift_runs_to_completion() {
        use lcasm_core::{MachineConfig, Register};
        use lcasm_lca::{LcaMachine, StopReason};

        let words = parse_words(include_str!("../programs/shift.hex")).unwrap();
        assert_eq!(words.len(), 13);

        let mut lca = LcaMachine::seeded(MachineConfig::default(), 7, Vec::new());
        lca.load(&words).unwrap();
        let summary = lca.run(100);
        assert_eq!(summary.stop, StopReason::EndOfProgram);
        assert_eq!(summary.steps, 13);

        let registers = lca.machine().registers();
        assert_eq!(registers.read(Register::V0), 1);
        assert_eq!(registers.read(Register::new(9)), 0);
        assert_eq!(registers.read(Register::new(12)), 1);

        let output = lca.into_output();
        assert_eq!(output[0], "WINST: Fortitude increased by 15");
        assert_eq!(
            output.last().map(String::as_str),
            Some("PANIC: Clerk in register $9 has panicked! Register cleared to 0.")
        );
    }

    #[test]
    fn missing_file_has_context() {
        let err = load(Path::new("/nonexistent/program.hex")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/program.hex"));
    }
}
