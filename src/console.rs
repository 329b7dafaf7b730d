//! Terminal front end: typed commands in, rendered updates out.

use std::io::Write;

use crate::app::{Command, UiUpdate};
use crate::modal::ModalAction;
use crate::order_list::OrderRow;

pub const HELP_TEXT: &str = "\
Commands:
  list           show the pending orders
  reload         fetch and add new pending orders
  view <id>      show an order's items and open the confirmation
  delete <id>    delete an order from the list
  release        print the receipt and release the open order
  remove         delete the open order
  back           close the confirmation without changes
  dismiss        hide the error banner
  help           show this text
  quit           exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    Help,
    Blank,
}

pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(Input::Blank);
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for '{word}'"));
    }

    let needs_id = |name: &str| {
        arg.map(|id| id.trim_start_matches('#').to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| format!("usage: {name} <id>"))
    };
    let no_arg = |cmd: Command| match arg {
        Some(_) => Err(format!("'{word}' takes no arguments")),
        None => Ok(Input::Command(cmd)),
    };

    match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => no_arg(Command::ShowList),
        "reload" => no_arg(Command::Reload),
        "view" => Ok(Input::Command(Command::Consult(needs_id("view")?))),
        "delete" => Ok(Input::Command(Command::DeleteRow(needs_id("delete")?))),
        "release" => no_arg(Command::Modal(ModalAction::Release)),
        "remove" => no_arg(Command::Modal(ModalAction::Delete)),
        "back" => no_arg(Command::Modal(ModalAction::Return)),
        "dismiss" => no_arg(Command::DismissBanner),
        "quit" | "exit" => no_arg(Command::Quit),
        "help" | "?" => Ok(Input::Help),
        other => Err(format!("unknown command '{other}' (type 'help')")),
    }
}

/// Where UI updates end up.
pub trait Presenter {
    fn render(&mut self, update: &UiUpdate);

    fn show_help(&mut self);

    fn show_error(&mut self, message: &str);
}

pub struct ConsolePresenter<W: Write> {
    out: W,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn row(&mut self, row: &OrderRow) {
        for line in row.lines() {
            let _ = writeln!(self.out, "  {line}");
        }
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn render(&mut self, update: &UiUpdate) {
        // Terminal write failures have nowhere better to go.
        match update {
            UiUpdate::RowAdded(row) => {
                let _ = writeln!(self.out, "+ Nueva orden #{}", row.id);
                self.row(row);
            }
            UiUpdate::RowRemoved(id) => {
                let _ = writeln!(self.out, "- Orden #{id} retirada");
            }
            UiUpdate::ModalOpened(view) => {
                let _ = writeln!(self.out, "==== Confirmar orden ====");
                for line in &view.header {
                    let _ = writeln!(self.out, "{line}");
                }
                for entry in &view.entries {
                    let _ = writeln!(self.out, "--");
                    for line in entry.lines() {
                        let _ = writeln!(self.out, "  {line}");
                    }
                }
                let _ = writeln!(self.out, "[release] Imprimir  [remove] Eliminar  [back] Regresar");
            }
            UiUpdate::ModalClosed => {
                let _ = writeln!(self.out, "==== Confirmacion cerrada ====");
            }
            UiUpdate::BannerShown(text) => {
                let _ = writeln!(self.out, "!! {text}");
            }
            UiUpdate::BannerHidden => {}
            UiUpdate::Notice(text) => {
                let _ = writeln!(self.out, "{text}");
            }
            UiUpdate::ListSnapshot(rows) => {
                if rows.is_empty() {
                    let _ = writeln!(self.out, "No hay ordenes pendientes");
                }
                for row in rows {
                    self.row(row);
                    let _ = writeln!(self.out);
                }
            }
        }
        self.flush();
    }

    fn show_help(&mut self) {
        let _ = writeln!(self.out, "{HELP_TEXT}");
        self.flush();
    }

    fn show_error(&mut self, message: &str) {
        let _ = writeln!(self.out, "error: {message}");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PRINT_ERROR_BANNER;
    use crate::detail::DetailView;
    use crate::testing::{line_item, pending};

    fn rendered(updates: &[UiUpdate]) -> String {
        let mut presenter = ConsolePresenter::new(Vec::new());
        for update in updates {
            presenter.render(update);
        }
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn parses_every_command() {
        let cases = [
            ("list", Command::ShowList),
            ("reload", Command::Reload),
            ("view 12", Command::Consult("12".into())),
            ("view #12", Command::Consult("12".into())),
            ("delete 7", Command::DeleteRow("7".into())),
            ("release", Command::Modal(ModalAction::Release)),
            ("remove", Command::Modal(ModalAction::Delete)),
            ("back", Command::Modal(ModalAction::Return)),
            ("dismiss", Command::DismissBanner),
            ("  QUIT  ", Command::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_input(line), Ok(Input::Command(expected)), "{line}");
        }
        assert_eq!(parse_input("help"), Ok(Input::Help));
        assert_eq!(parse_input("   "), Ok(Input::Blank));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_input("view").is_err());
        assert!(parse_input("view #").is_err());
        assert!(parse_input("release 3").is_err());
        assert!(parse_input("delete 1 2").is_err());
        assert!(parse_input("print").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn renders_rows_and_banner() {
        let row = OrderRow::from_summary(&pending("4"));
        let text = rendered(&[
            UiUpdate::RowAdded(row),
            UiUpdate::BannerShown(PRINT_ERROR_BANNER.into()),
        ]);
        assert!(text.contains("Nombre y ID: Cliente 4 #4"));
        assert!(text.contains("Total: 223.20$"));
        assert!(text.contains(&format!("!! {PRINT_ERROR_BANNER}")));
    }

    #[test]
    fn renders_modal_entries() {
        let mut detail = DetailView::new();
        detail.load(Ok(vec![line_item("Taco", "PZA", 12.5)]));
        let text = rendered(&[UiUpdate::ModalOpened(detail.modal_view(&pending("4")))]);
        assert!(text.contains("ID: Cliente 4 #4"));
        assert!(text.contains("Producto: Taco"));
        assert!(text.contains("Cantidad y Unidad: 1 PZA"));
        assert!(text.contains("Total: $12.5"));
    }

    #[test]
    fn empty_snapshot_says_so() {
        assert_eq!(
            rendered(&[UiUpdate::ListSnapshot(Vec::new())]),
            "No hay ordenes pendientes\n"
        );
    }
}
