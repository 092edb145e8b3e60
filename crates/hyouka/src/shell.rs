//! Interactive parameter shell.
//!
//! A line-oriented session: `key value` / `key=value` assignments plus
//! a handful of commands. Errors are echoed with a `[!]` prefix and the
//! session always survives them.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::params::{SessionParams, split_tokens};
use crate::pipeline::App;

const PROMPT: &str = ">>> ";

/// One parsed input line.
#[derive(Debug, PartialEq)]
enum Input {
    Start,
    Quit,
    Help,
    Show,
    Reset,
    GenreAll,
    GenreAny(Vec<String>),
    Assign { key: String, value: Option<String> },
    Empty,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    match line.to_ascii_lowercase().as_str() {
        "start" => return Input::Start,
        "quit" | "exit" => return Input::Quit,
        "help" => return Input::Help,
        "show" => return Input::Show,
        "reset" => return Input::Reset,
        "genre_all" => return Input::GenreAll,
        _ => {}
    }
    if let Some(rest) = strip_command(line, "genre_any") {
        return Input::GenreAny(split_tokens(rest));
    }
    let (key, value) = match line.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, Some(value)),
            None => (line, None),
        },
    };
    Input::Assign {
        key: key.trim().to_string(),
        value: value.map(|v| v.trim().to_string()),
    }
}

/// Case-insensitive command prefix followed by end of line or whitespace.
fn strip_command<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    if line.len() < command.len() {
        return None;
    }
    let (head, rest) = line.split_at(command.len());
    if !head.eq_ignore_ascii_case(command) {
        return None;
    }
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// The read-eval loop around one [`App`] and one parameter set.
pub struct Shell {
    editor: DefaultEditor,
    params: SessionParams,
    app: App,
}

impl Shell {
    /// # Errors
    ///
    /// Fails only when the line editor cannot be initialized.
    pub fn new(app: App, params: SessionParams) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            params,
            app,
        })
    }

    /// Runs until `quit`, Ctrl-C, or EOF.
    ///
    /// # Errors
    ///
    /// Only unrecoverable line-editor failures; every pipeline or
    /// parameter error is printed and the loop continues.
    pub fn run(&mut self) -> Result<()> {
        println!("{}", help_text());
        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            };
            let _ = self.editor.add_history_entry(line.as_str());
            if !self.dispatch(&line) {
                break;
            }
        }
        Ok(())
    }

    /// Handles one line; returns `false` to leave the loop.
    fn dispatch(&mut self, line: &str) -> bool {
        match parse_input(line) {
            Input::Empty => {}
            Input::Quit => return false,
            Input::Help => println!("{}", help_text()),
            Input::Show => print!("{}", self.params.show()),
            Input::Reset => {
                self.params = SessionParams::default();
                println!("Reset to defaults.");
            }
            Input::GenreAll => match self.app.resolver() {
                Ok(resolver) => {
                    println!("\nGenres (id : name):");
                    for (id, name) in resolver.list_all() {
                        println!("  {id:>3} : {name}");
                    }
                    println!();
                }
                Err(err) => println!("[!] Failed to fetch genres: {err:#}"),
            },
            Input::GenreAny(tokens) => self.set_any_genres(tokens),
            Input::Assign { key, value } => match self.params.set(&key, value.as_deref()) {
                Ok(rendered) => println!("ok: {key} = {rendered}"),
                Err(err) => println!("[!] Set failed: {err:#}"),
            },
            Input::Start => {
                if let Err(err) = self.app.run(&self.params) {
                    println!("[!] Run failed: {err:#}");
                }
            }
        }
        true
    }

    /// `genre_any` resolves eagerly so typos surface immediately; the
    /// canonical names land in `any_genres` like a plain assignment.
    fn set_any_genres(&mut self, tokens: Vec<String>) {
        if tokens.is_empty() {
            println!("[!] Usage: genre_any <name or ID, comma/space separated>");
            return;
        }
        let resolved = match self.app.resolver() {
            Ok(resolver) => resolver.resolve_set(&tokens),
            Err(err) => {
                println!("[!] Failed to fetch genres: {err:#}");
                return;
            }
        };
        match resolved {
            Ok(names) => {
                let names: Vec<String> = names.into_iter().collect();
                println!("ok: any_genres = {names:?}");
                self.params.any_genres = Some(names);
            }
            Err(err) => println!("[!] {err}"),
        }
    }
}

fn help_text() -> String {
    let defaults = SessionParams::default();
    format!(
        "\nType `key value` or `key=value` to set; repeat to overwrite; `start` to run.\n\
         Params:\n\
         \x20 q               keyword (title search)  [default: \"\"]\n\
         \x20 type            tv / movie / ova / special / ona / music  [default: unset]\n\
         \x20 status          airing / complete / upcoming  [default: unset]\n\
         \x20 year_from       start year, inclusive  [default: unset]\n\
         \x20 year_to         end year, inclusive  [default: unset]\n\
         \x20 min_score       minimum mean score (0-10)  [default: unset]\n\
         \x20 min_scored_by   minimum number of voters  [default: unset]\n\
         \x20 any_genres      match any of these genres (names or IDs)  [default: unset]\n\
         \x20 all_genres      must include all of these genres  [default: unset]\n\
         \x20 limit_per_page  items per page (1-25)  [default: {limit}]\n\
         \x20 max_pages       max pages to fetch  [default: {pages}]\n\
         \x20 sfw             safe-for-work only; toggles  [default: false]\n\
         \x20 no_fetch        skip fetching, analyze the cache; toggles  [default: false]\n\
         \x20 csv             cache path  [default: {cache}]\n\
         \x20 prior_m         Bayesian prior weight m  [default: derived]\n\
         \x20 topk            chart top K  [default: {topk}]\n\
         \x20 use_anilist     cross-reference AniList; toggles  [default: false]\n\
         \x20 al_pop_alpha    AniList popularity -> pseudo-votes  [default: {alpha}]\n\
         \nCommands:\n\
         \x20 show                print current params\n\
         \x20 reset               reset to defaults\n\
         \x20 help                show this help\n\
         \x20 genre_all           list all genres (id : name)\n\
         \x20 genre_any <tokens>  set any-match genres by name or ID\n\
         \x20 start               fetch -> filter -> score -> chart\n\
         \x20 quit                exit\n",
        limit = defaults.limit_per_page,
        pages = defaults.max_pages,
        cache = defaults.cache_path.display(),
        topk = defaults.top_k,
        alpha = defaults.popularity_alpha,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_case_insensitively() {
        assert_eq!(parse_input("START"), Input::Start);
        assert_eq!(parse_input("  quit "), Input::Quit);
        assert_eq!(parse_input("exit"), Input::Quit);
        assert_eq!(parse_input("Genre_All"), Input::GenreAll);
        assert_eq!(parse_input(""), Input::Empty);
    }

    #[test]
    fn genre_any_collects_its_tokens() {
        assert_eq!(
            parse_input("genre_any Action, Fantasy 10"),
            Input::GenreAny(vec![
                "Action".to_string(),
                "Fantasy".to_string(),
                "10".to_string()
            ])
        );
        assert_eq!(parse_input("genre_any"), Input::GenreAny(vec![]));
        // no underscore-prefix confusion with assignments
        assert_eq!(
            parse_input("genre_anything x"),
            Input::Assign {
                key: "genre_anything".to_string(),
                value: Some("x".to_string())
            }
        );
    }

    #[test]
    fn assignments_split_on_equals_or_whitespace() {
        assert_eq!(
            parse_input("year_from=2010"),
            Input::Assign {
                key: "year_from".to_string(),
                value: Some("2010".to_string())
            }
        );
        assert_eq!(
            parse_input("q cowboy bebop"),
            Input::Assign {
                key: "q".to_string(),
                value: Some("cowboy bebop".to_string())
            }
        );
        assert_eq!(
            parse_input("sfw"),
            Input::Assign {
                key: "sfw".to_string(),
                value: None
            }
        );
        // empty right-hand side stays distinguishable from no value
        assert_eq!(
            parse_input("type="),
            Input::Assign {
                key: "type".to_string(),
                value: Some(String::new())
            }
        );
    }
}
