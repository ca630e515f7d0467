use clap::{Arg, ArgAction, Command};
use color_eyre::Result;
use ratatui::{
    crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    layout::{Constraint, Layout, Position},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, List, ListItem, Paragraph},
    DefaultTerminal, Frame,
};

use regexer::{lexer::lambda_calculus_rules, parse_regex, Dfa, LexError, Lexer};

const EXIT_SUCCESS: i32 = 0;
const EXIT_PATTERN_ERROR: i32 = 1;
const EXIT_IO_ERROR: i32 = 2;
const EXIT_OTHER_ERROR: i32 = 3;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let matches = Command::new("regexer")
        .version("0.1.0")
        .about("A lexical-analysis engine: regex parser, Thompson/subset construction, a longest-match scanner.")
        .long_about(
"regexer compiles ordered (name, regex) rules into a single DFA and scans text into a stream of
named lexemes using longest-match, earliest-rule-wins semantics. It does not evaluate the
resulting lexeme stream — that is an external collaborator's job.

  regexer lex <PATH>              tokenize a file with the built-in lambda-calculus rule set
  regexer match [-i] <PATTERN> <TEXT>   test whether TEXT is accepted by PATTERN
"
        )
        .after_help(
"Examples:
  regexer lex input.txt
  regexer match \"[a-g]*_?[0-9]+\" \"aba_110\"
  regexer match -i \"(a|b)*q+cb[0-9]*\" \"bbaqcb\"

Exit Codes:
  0   Success
  1   Error in regex pattern, or a lex diagnostic
  2   File not found / IO error
  3   Other errors

For more information, visit:
  GitHub: https://github.com/Nyxerproject"
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("lex")
                .about("Tokenize a file with the built-in lambda-calculus rule set")
                .arg(
                    Arg::new("path")
                        .help("Path to the file to tokenize")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("match")
                .about("Test whether TEXT is accepted by the DFA compiled from PATTERN")
                .arg(Arg::new("pattern").help("The regular expression pattern to match").required(true))
                .arg(
                    Arg::new("text")
                        .help("The text to test (ignored with -i, used to pre-fill the TUI)")
                        .required(false),
                )
                .arg(
                    Arg::new("interactive")
                        .short('i')
                        .long("interactive")
                        .help("Launch the interactive TUI mode")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("lex", sub)) => run_lex(sub.get_one::<String>("path").expect("required")),
        Some(("match", sub)) => run_match(
            sub.get_one::<String>("pattern").expect("required"),
            sub.get_one::<String>("text"),
            sub.get_flag("interactive"),
        ),
        _ => unreachable!("subcommand_required(true)"),
    }
}

fn run_lex(path: &str) -> Result<()> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Could not read {path}: {e}");
            std::process::exit(EXIT_IO_ERROR);
        }
    };
    let contents = contents.replace('\n', "").replace('\t', "");

    let rules = lambda_calculus_rules();
    let lexer = match Lexer::new(&rules) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Internal error compiling the built-in lexer: {e}");
            std::process::exit(EXIT_OTHER_ERROR);
        }
    };

    let lexemes = lexer.lex(&contents);
    if let [lexeme] = lexemes.as_slice() {
        if lexeme.name.is_empty() {
            eprintln!("{}", lexeme.text);
            std::process::exit(EXIT_PATTERN_ERROR);
        }
    }
    for lexeme in &lexemes {
        println!("({}, {:?})", lexeme.name, lexeme.text);
    }
    Ok(())
}

fn run_match(pattern: &str, text: Option<&String>, interactive: bool) -> Result<()> {
    if interactive {
        let mut app = App::new();
        app.set_pattern(pattern);
        if let Some(t) = text {
            app.set_text(t);
        }
        let terminal = ratatui::init();
        let app_result = app.run(terminal);
        ratatui::restore();
        return app_result;
    }

    let Some(text) = text else {
        eprintln!("match requires TEXT unless -i/--interactive is given. See --help for usage.");
        std::process::exit(EXIT_OTHER_ERROR);
    };

    match compile_pattern(pattern) {
        Ok(dfa) => {
            println!("{}", dfa.accept(text));
            Ok(())
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(EXIT_PATTERN_ERROR);
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Dfa, LexError> {
    Ok(parse_regex(pattern)?.thompson().subset_construction())
}

/// App holds the state of the application
struct App {
    /// Current value of the input box (for text)
    input: String,
    /// Current pattern (separate from input text)
    pattern: String,
    /// Position of cursor in the editor area.
    character_index: usize,
    /// Current input mode
    input_mode: InputMode,
    /// History of recorded expressions, each resolved against the engine at submit time
    expressions: Vec<String>,
}

enum InputMode {
    Normal,
    Editing,
}

impl App {
    fn new() -> Self {
        Self {
            input: String::new(),
            pattern: String::new(),
            input_mode: InputMode::Normal,
            expressions: Vec::new(),
            character_index: 0,
        }
    }

    fn set_pattern(&mut self, p: &str) {
        self.pattern = p.to_string();
    }

    fn set_text(&mut self, t: &str) {
        self.input = t.to_string();
        self.character_index = self.input.chars().count();
    }

    fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.character_index.saturating_sub(1);
        self.character_index = self.clamp_cursor(cursor_moved_left);
    }

    fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.character_index.saturating_add(1);
        self.character_index = self.clamp_cursor(cursor_moved_right);
    }

    fn enter_char(&mut self, new_char: char) {
        let index = self.byte_index();
        self.input.insert(index, new_char);
        self.move_cursor_right();
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.character_index)
            .unwrap_or(self.input.len())
    }

    fn delete_char(&mut self) {
        if self.character_index != 0 {
            let current_index = self.character_index;
            let from_left_to_current_index = current_index - 1;

            let before_char_to_delete = self.input.chars().take(from_left_to_current_index);
            let after_char_to_delete = self.input.chars().skip(current_index);

            self.input = before_char_to_delete.chain(after_char_to_delete).collect();
            self.move_cursor_left();
        }
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.input.chars().count())
    }

    fn reset_cursor(&mut self) {
        self.character_index = 0;
    }

    /// Compile the current pattern and test it against the current text, recording the result
    /// to the expression history instead of just echoing the two fields back.
    fn submit_expression(&mut self) {
        let verdict = match compile_pattern(&self.pattern) {
            Ok(dfa) if dfa.accept(&self.input) => "accepted".to_string(),
            Ok(_) => "rejected".to_string(),
            Err(e) => format!("error: {e}"),
        };
        self.expressions
            .push(format!("{} on {:?} => {verdict}", self.pattern, self.input));
        self.input.clear();
        self.reset_cursor();
    }

    fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if let Event::Key(key) = event::read()? {
                // Handle Ctrl+C globally
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                match self.input_mode {
                    InputMode::Normal => match key.code {
                        KeyCode::Char('e') => {
                            self.input_mode = InputMode::Editing;
                        }
                        KeyCode::Char('q') | KeyCode::Esc => {
                            return Ok(());
                        }
                        _ => {}
                    },
                    InputMode::Editing if key.kind == KeyEventKind::Press => match key.code {
                        KeyCode::Enter => self.submit_expression(),
                        KeyCode::Char(to_insert) => self.enter_char(to_insert),
                        KeyCode::Backspace => self.delete_char(),
                        KeyCode::Left => self.move_cursor_left(),
                        KeyCode::Right => self.move_cursor_right(),
                        KeyCode::Esc => self.input_mode = InputMode::Normal,
                        _ => {}
                    },
                    InputMode::Editing => {}
                }
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let vertical = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ]);
        let [help_area, pattern_area, input_area, expressions_area] = vertical.areas(frame.area());

        let (msg, style) = match self.input_mode {
            InputMode::Normal => (
                vec![
                    "Press ".into(),
                    "q".bold(),
                    " or ".into(),
                    "Esc".bold(),
                    " to exit, ".into(),
                    "e".bold(),
                    " to start typing, or Ctrl+C at any time to exit.".into(),
                ],
                Style::default().add_modifier(Modifier::RAPID_BLINK),
            ),
            InputMode::Editing => (
                vec![
                    "Press ".into(),
                    "Esc".bold(),
                    " to stop editing, ".into(),
                    "Enter".bold(),
                    " to test the text against the pattern, or Ctrl+C at any time to exit.".into(),
                ],
                Style::default(),
            ),
        };
        let text = Text::from(Line::from(msg)).patch_style(style);
        let help_message = Paragraph::new(text);
        frame.render_widget(help_message, help_area);

        let pattern_par = Paragraph::new(self.pattern.as_str())
            .style(Style::default().fg(Color::Cyan))
            .block(Block::bordered().title("Pattern"));
        frame.render_widget(pattern_par, pattern_area);

        let input = Paragraph::new(self.input.as_str())
            .style(match self.input_mode {
                InputMode::Normal => Style::default(),
                InputMode::Editing => Style::default().fg(Color::Yellow),
            })
            .block(Block::bordered().title("Text"));
        frame.render_widget(input, input_area);

        match self.input_mode {
            InputMode::Normal => {}
            InputMode::Editing => frame.set_cursor_position(Position::new(
                input_area.x + self.character_index as u16 + 1,
                input_area.y + 1,
            )),
        }

        let expressions: Vec<ListItem> = self
            .expressions
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let content = Line::from(Span::raw(format!("{i}: {m}")));
                ListItem::new(content)
            })
            .collect();
        let expressions = List::new(expressions).block(Block::bordered().title("Expressions"));
        frame.render_widget(expressions, expressions_area);
    }
}
