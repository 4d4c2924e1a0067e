//! Parsing of REPL input lines.

use shared::Mode;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Prompt(String),
    Mode(Mode),
    Model(String),
    Models,
    /// Set the API key; an empty key clears it.
    Key(String),
    Image(PathBuf),
    DropImage,
    /// List templates for the active mode.
    Templates,
    Template(String),
    Libraries,
    Library(String),
    Undo,
    Clear,
    Save(Option<PathBuf>),
    Show,
    Status,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Prompt(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "mode" if arg.is_empty() => Command::Invalid("usage: /mode html|three|python".into()),
            "mode" => match arg.parse::<Mode>() {
                Ok(mode) => Command::Mode(mode),
                Err(e) => Command::Invalid(e.to_string()),
            },
            "model" if arg.is_empty() => Command::Invalid("usage: /model <model id>".into()),
            "model" => Command::Model(arg.to_string()),
            "models" => Command::Models,
            "key" => Command::Key(arg.to_string()),
            "image" if arg.is_empty() => Command::DropImage,
            "image" => Command::Image(PathBuf::from(arg)),
            "template" | "templates" if arg.is_empty() => Command::Templates,
            "template" => Command::Template(arg.to_string()),
            "lib" | "libs" if arg.is_empty() => Command::Libraries,
            "lib" => Command::Library(arg.to_string()),
            "undo" => Command::Undo,
            "clear" => Command::Clear,
            "save" if arg.is_empty() => Command::Save(None),
            "save" => Command::Save(Some(PathBuf::from(arg))),
            "show" => Command::Show,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("unknown command '/{}' (try /help)", other)),
        }
    }
}

pub const HELP: &str = "\
Type a request to generate code for the active mode.

  /mode html|three|python   switch the active buffer
  /model <id>               select a model (see /models)
  /models                   list available models
  /key <api key>            set the OpenRouter key (empty clears it)
  /image <path>             attach an image to the next request
  /image                    drop the attached image
  /template [name]          list or load a starter template
  /lib [name]               list or insert a CDN library (HTML only)
  /undo                     revert the last AI change
  /clear                    clear conversation history
  /save [path]              write the active buffer to disk
  /show                     print the active buffer
  /status                   show mode, model, key and queue state
  /quit                     exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_prompts() {
        assert_eq!(Command::parse("  make a clock "), Command::Prompt("make a clock".into()));
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(Command::parse("/mode three"), Command::Mode(Mode::Scene));
        assert_eq!(
            Command::parse("/model  openai/gpt-5.1 "),
            Command::Model("openai/gpt-5.1".into())
        );
        assert_eq!(Command::parse("/key sk-or-1"), Command::Key("sk-or-1".into()));
        assert_eq!(Command::parse("/key"), Command::Key(String::new()));
        assert_eq!(
            Command::parse("/image ~/shots/a b.png"),
            Command::Image(PathBuf::from("~/shots/a b.png"))
        );
        assert_eq!(Command::parse("/image"), Command::DropImage);
        assert_eq!(Command::parse("/template particles"), Command::Template("particles".into()));
        assert_eq!(Command::parse("/template"), Command::Templates);
        assert_eq!(Command::parse("/lib  tailwind"), Command::Library("tailwind".into()));
        assert_eq!(Command::parse("/libs"), Command::Libraries);
        assert_eq!(Command::parse("/save"), Command::Save(None));
        assert_eq!(
            Command::parse("/save out/page.html"),
            Command::Save(Some(PathBuf::from("out/page.html")))
        );
    }

    #[test]
    fn test_bare_commands() {
        assert_eq!(Command::parse("/UNDO"), Command::Undo);
        assert_eq!(Command::parse("/models"), Command::Models);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("/status"), Command::Status);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(Command::parse("/mode ruby"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/mode"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/model"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/frobnicate"), Command::Invalid(_)));
    }
}
