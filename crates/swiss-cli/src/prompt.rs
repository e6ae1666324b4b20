//! Line-oriented prompting over any reader and writer.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Writes a line of output.
    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Asks a question and returns the trimmed answer, or `None` at end of input.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks until `parse` accepts the answer, printing each rejection.
    pub fn ask_parsed<T, E: Display>(
        &mut self,
        question: &str,
        parse: impl Fn(&str) -> Result<T, E>,
    ) -> io::Result<Option<T>> {
        while let Some(answer) = self.ask(question)? {
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => self.say(format!("  {e}"))?,
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_trims_and_detects_eof() {
        let mut p = prompter("  hello \n");
        assert_eq!(p.ask("> ").unwrap(), Some("hello".to_string()));
        assert_eq!(p.ask("> ").unwrap(), None);
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "> > ");
    }

    #[test]
    fn test_ask_parsed_retries() {
        let mut p = prompter("abc\n12\n");
        let value = p
            .ask_parsed("Rounds: ", |s| s.parse::<u32>().map_err(|_| format!("'{s}' is not a number")))
            .unwrap();
        assert_eq!(value, Some(12));
        let output = String::from_utf8(p.into_output()).unwrap();
        assert!(output.contains("'abc' is not a number"));
        assert_eq!(output.matches("Rounds: ").count(), 2);
    }
}
