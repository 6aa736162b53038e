//! Interactive address entry.

use std::io::{self, BufRead, Write};

/// Ask for a node address until a non-zero number is entered.
///
/// Returns `Ok(None)` if the input ends first.
pub fn prompt_for_address<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> io::Result<Option<u16>> {
    let mut line = String::new();
    loop {
        write!(output, "Enter node address: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match line.trim().parse::<u16>() {
            Ok(address) if address != 0 => {
                writeln!(output, "Address: {}", address)?;
                return Ok(Some(address));
            }
            _ => writeln!(output, "Invalid address '{}'", line.trim())?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_first_valid() {
        let mut out = Vec::new();
        let address = prompt_for_address(&b"42\n"[..], &mut out).unwrap();
        assert_eq!(address, Some(42));
        assert_eq!(String::from_utf8(out).unwrap(), "Enter node address: Address: 42\n");
    }

    #[test]
    fn test_reprompts_on_bad_input() {
        let mut out = Vec::new();
        let address = prompt_for_address(&b"abc\n0\n70000\n  7 \n"[..], &mut out).unwrap();
        assert_eq!(address, Some(7));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Enter node address: ").count(), 4);
        assert_eq!(text.matches("Invalid address").count(), 3);
    }

    #[test]
    fn test_end_of_input() {
        let mut out = Vec::new();
        assert_eq!(prompt_for_address(&b"x\n"[..], &mut out).unwrap(), None);
    }
}
