//! Line-oriented frontend: commands on stdin, preview written to a PNG file.

use anyhow::{Context, Result, anyhow, bail};
use image::RgbImage;
use std::borrow::Cow;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::controller::{FormController, Frontend};

const HELP: &str = "\
Commands:
  user [text]     set the username (no text clears it)
  pass [text]     set the temporary password
  add             add the current form to the batch
  select [n]      select batch row n (no number clears the selection)
  remove          remove the selected batch row
  list            show the batch
  pdf             save the current form as a one-page PDF
  save            save the whole batch as one PDF
  import <file>   add username,password rows from a CSV file
  help            show this text
  quit            leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Username(String),
    Password(String),
    Add,
    /// Zero-based list position.
    Select(Option<usize>),
    Remove,
    List,
    Individual,
    SaveBatch,
    Import(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']).trim_start();
        let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));

        let command = match verb {
            "user" => Command::Username(arg.to_string()),
            "pass" => Command::Password(arg.to_string()),
            "add" => Command::Add,
            "select" => match arg.trim() {
                "" => Command::Select(None),
                n => {
                    let n: usize = n.parse().with_context(|| format!("not a row number: {}", n))?;
                    if n == 0 {
                        bail!("rows are numbered from 1");
                    }
                    Command::Select(Some(n - 1))
                }
            },
            "remove" => Command::Remove,
            "list" => Command::List,
            "pdf" => Command::Individual,
            "save" => Command::SaveBatch,
            "import" => match arg.trim() {
                "" => bail!("import needs a CSV file path"),
                path => Command::Import(PathBuf::from(path)),
            },
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(anyhow!("unknown command '{}', type 'help'", verb)),
        };
        Ok(command)
    }
}

pub struct TerminalFrontend<R, W> {
    input: R,
    output: W,
    preview_path: PathBuf,
}

impl<R: BufRead, W: Write> TerminalFrontend<R, W> {
    pub fn new(input: R, output: W, preview_path: PathBuf) -> Self {
        Self {
            input,
            output,
            preview_path,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Next input line without its line ending; `None` at end of input.
    ///
    /// Bytes that are not UTF-8 become U+FFFD instead of ending the session.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = line {
            warn!("input line is not valid UTF-8, invalid bytes replaced");
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, message: &str) {
        // A closed terminal leaves nobody to tell.
        let _ = writeln!(self.output, "{}", message);
        let _ = self.output.flush();
    }
}

impl<R: BufRead, W: Write> Frontend for TerminalFrontend<R, W> {
    fn show_preview(&mut self, preview: &RgbImage) -> Result<()> {
        preview
            .save(&self.preview_path)
            .with_context(|| format!("Failed to write preview to {:?}", self.preview_path))
    }

    fn show_rows(&mut self, rows: &[String]) {
        if rows.is_empty() {
            self.say("Batch is empty.");
            return;
        }
        self.say("Batch:");
        for (i, row) in rows.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, row));
        }
    }

    fn ask_save_path(&mut self) -> Option<PathBuf> {
        let _ = write!(self.output, "Save PDF as (empty to cancel): ");
        let _ = self.output.flush();

        let line = match self.read_line() {
            Ok(line) => line?,
            Err(e) => {
                warn!(error = %e, "failed to read save path");
                return None;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let mut path = PathBuf::from(line);
        if path.extension().is_none() {
            path.set_extension("pdf");
        }
        Some(path)
    }

    fn warn(&mut self, message: &str) {
        self.say(&format!("Warning: {}", message));
    }

    fn info(&mut self, message: &str) {
        self.say(message);
    }
}

fn dispatch<R: BufRead, W: Write>(
    controller: &mut FormController<TerminalFrontend<R, W>>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Username(text) => controller.set_username(&text)?,
        Command::Password(text) => controller.set_password(&text)?,
        Command::Add => controller.add_to_batch()?,
        Command::Select(index) => {
            controller.select(index);
            if index.is_some() && controller.state().selection.is_none() {
                controller.frontend_mut().warn("No such row.");
            }
        }
        Command::Remove => controller.remove_selected(),
        Command::List => {
            let rows = controller.state().rows.clone();
            controller.frontend_mut().show_rows(&rows);
        }
        Command::Individual => controller.generate_individual()?,
        Command::SaveBatch => controller.save_batch()?,
        Command::Import(path) => {
            let added = controller.import_csv(&path)?;
            controller.frontend_mut().info(&format!("Imported {} labels.", added));
        }
        Command::Help => controller.frontend_mut().say(HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Read and run commands until `quit` or end of input.
///
/// Handler failures are reported and the session continues.
pub fn run_session<R: BufRead, W: Write>(controller: &mut FormController<TerminalFrontend<R, W>>) -> Result<()> {
    let preview_path = controller.frontend().preview_path.clone();
    controller
        .frontend_mut()
        .say(&format!("Preview: {}. Type 'help' for commands.", preview_path.display()));

    while let Some(line) = controller.frontend_mut().read_line()? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                controller.frontend_mut().say(&e.to_string());
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = dispatch(controller, command) {
            let report = e.chain().map(|c| c.to_string()).collect::<Vec<_>>().join(": ");
            controller.frontend_mut().say(&format!("Error: {}", report));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabelLayout;
    use crate::label::{LabelRenderer, TextFont};
    use std::io::Cursor;

    type Session = FormController<TerminalFrontend<Cursor<Vec<u8>>, Vec<u8>>>;

    fn session(script: &str, preview: PathBuf) -> Session {
        let renderer = LabelRenderer::with_font(LabelLayout::default(), TextFont::Bitmap);
        let frontend = TerminalFrontend::new(Cursor::new(script.as_bytes().to_vec()), Vec::new(), preview);
        FormController::new(renderer, frontend).unwrap()
    }

    fn transcript(controller: &Session) -> String {
        String::from_utf8(controller.frontend().output().clone()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("user alice".parse::<Command>().unwrap(), Command::Username("alice".into()));
        assert_eq!("user".parse::<Command>().unwrap(), Command::Username(String::new()));
        assert_eq!("pass two words\n".parse::<Command>().unwrap(), Command::Password("two words".into()));
        assert_eq!("select 2".parse::<Command>().unwrap(), Command::Select(Some(1)));
        assert_eq!("select".parse::<Command>().unwrap(), Command::Select(None));
        assert_eq!("import data.csv".parse::<Command>().unwrap(), Command::Import("data.csv".into()));
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("select 0".parse::<Command>().is_err());
        assert!("select two".parse::<Command>().is_err());
        assert!("import".parse::<Command>().is_err());
        assert!("print".parse::<Command>().is_err());
    }

    #[test]
    fn test_save_prompt_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut frontend = TerminalFrontend::new(
            Cursor::new(b"labels\n\nout.PDF\n".to_vec()),
            Vec::new(),
            dir.path().join("preview.png"),
        );
        assert_eq!(frontend.ask_save_path(), Some(PathBuf::from("labels.pdf")));
        assert_eq!(frontend.ask_save_path(), None);
        assert_eq!(frontend.ask_save_path(), Some(PathBuf::from("out.PDF")));
        // End of input cancels.
        assert_eq!(frontend.ask_save_path(), None);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = LabelRenderer::with_font(LabelLayout::default(), TextFont::Bitmap);
        let script = b"user \xff\xfe\nuser bob\n".to_vec();
        let frontend = TerminalFrontend::new(Cursor::new(script), Vec::new(), dir.path().join("preview.png"));
        let mut controller = FormController::new(renderer, frontend).unwrap();

        run_session(&mut controller).unwrap();
        assert_eq!(controller.state().username, "bob");
    }

    #[test]
    fn test_lossy_line_keeps_valid_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut frontend = TerminalFrontend::new(
            Cursor::new(b"pass a\xffb\r\n".to_vec()),
            Vec::new(),
            dir.path().join("preview.png"),
        );
        assert_eq!(frontend.read_line().unwrap(), Some("pass a\u{FFFD}b".to_string()));
        assert_eq!(frontend.read_line().unwrap(), None);
    }

    #[test]
    fn test_save_prompt_read_error_cancels() {
        struct Broken;

        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("terminal gone"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut frontend = TerminalFrontend::new(
            std::io::BufReader::new(Broken),
            Vec::new(),
            dir.path().join("preview.png"),
        );
        assert_eq!(frontend.ask_save_path(), None);
    }

    #[test]
    fn test_scripted_batch_session() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("batch.pdf");
        let preview = dir.path().join("preview.png");
        let script = format!(
            "user alice\npass p4ss1\nadd\nuser bob\npass p4ss2\nadd\nselect 1\nremove\nsave\n{}\nquit\nuser ignored\n",
            pdf.display()
        );

        let mut controller = session(&script, preview.clone());
        run_session(&mut controller).unwrap();

        let items = controller.batch().items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].username, "bob");
        assert!(controller.state().username.is_empty());
        assert_eq!(lopdf::Document::load(&pdf).unwrap().get_pages().len(), 1);
        assert_eq!(image::open(&preview).unwrap().width(), 350);
        assert!(transcript(&controller).contains("Batch of 1 labels saved."));
    }

    #[test]
    fn test_session_reports_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let script = "frobnicate\nadd\nimport /nonexistent/batch.csv\nselect 4\nuser carol\n";

        let mut controller = session(script, dir.path().join("preview.png"));
        run_session(&mut controller).unwrap();

        let out = transcript(&controller);
        assert!(out.contains("unknown command 'frobnicate'"));
        assert!(out.contains("Warning: Fill in both username and password."));
        assert!(out.contains("Error: Failed to open batch CSV"));
        assert!(out.contains("Warning: No such row."));
        assert_eq!(controller.state().username, "carol");
    }
}
