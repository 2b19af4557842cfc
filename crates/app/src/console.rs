use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented prompt over stdin.
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line; `None` once stdin is closed.
    pub async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_owned()))
    }

    /// Read lines until an empty one (or end of input).
    pub async fn read_block(&mut self) -> io::Result<String> {
        let mut block = String::new();
        while let Some(line) = self.lines.next_line().await? {
            if line.trim().is_empty() {
                break;
            }
            block.push_str(&line);
            block.push('\n');
        }
        Ok(block)
    }
}
