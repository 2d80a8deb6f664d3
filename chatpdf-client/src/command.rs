//! Input lines understood by the terminal front end.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Upload(&'a str),
    Quit,
    Ask(&'a str),
    /// `/upload` with no path.
    MissingPath,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();

        if trimmed == "/quit" {
            return Command::Quit;
        }

        if let Some(rest) = trimmed.strip_prefix("/upload") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let path = rest.trim();
                return if path.is_empty() {
                    Command::MissingPath
                } else {
                    Command::Upload(path)
                };
            }
        }

        Command::Ask(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_path() {
        assert_eq!(
            Command::parse("/upload  ./papers/doc.pdf "),
            Command::Upload("./papers/doc.pdf")
        );
        assert_eq!(Command::parse("/upload"), Command::MissingPath);
    }

    #[test]
    fn parses_quit() {
        assert_eq!(Command::parse(" /quit\n"), Command::Quit);
    }

    #[test]
    fn everything_else_is_a_question() {
        assert_eq!(Command::parse("/uploads are broken?"), Command::Ask("/uploads are broken?"));
        assert_eq!(Command::parse("What is this?"), Command::Ask("What is this?"));
        assert_eq!(Command::parse(""), Command::Ask(""));
    }
}
