use crate::CliError;
use flatql_core::{
    generate::Generator,
    obs::{metrics_report, metrics_reset_all},
    schema::{SampleFetcher, SchemaCache},
};
use rustyline::{DefaultEditor, error::ReadlineError};

const PROMPT: &str = "flatql> ";

const HELP: &str = "\
Enter a condition expression, e.g. `price[>:10],sku`.
  .schema    print inferred paths
  .metrics   print generator metrics
  .reset     clear the schema cache and metrics
  .help      show this text
  .quit      leave the shell";

///
/// ShellCommand
///

#[derive(Debug, Eq, PartialEq)]
enum ShellCommand<'a> {
    Conditions(&'a str),
    Schema,
    Metrics,
    Reset,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

impl<'a> ShellCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "" => Self::Empty,
            ".schema" => Self::Schema,
            ".metrics" => Self::Metrics,
            ".reset" => Self::Reset,
            ".help" => Self::Help,
            ".quit" | ".exit" => Self::Quit,
            other if other.starts_with('.') => Self::Unknown(other),
            other => Self::Conditions(other),
        }
    }
}

/// Read-eval-print loop over condition expressions for one source column.
pub(crate) fn run(
    generator: &Generator<'_>,
    source: &str,
    column: &str,
    fetcher: &dyn SampleFetcher,
) -> Result<(), CliError> {
    let mut editor = DefaultEditor::new()?;
    println!("{source}.{column}: type .help for commands");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let command = ShellCommand::parse(&line);
        if command != ShellCommand::Empty {
            let _ = editor.add_history_entry(line.as_str());
        }

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Unknown(cmd) => println!("unknown command {cmd}; try .help"),

            ShellCommand::Conditions(conditions) => {
                println!("{}", generator.generate(source, column, conditions, fetcher));
            }

            ShellCommand::Schema => match generator.describe(source, column, fetcher) {
                Ok(schema) => {
                    for (path, entry) in schema.iter() {
                        println!(
                            "{path}  {}  depth={}  arrays=[{}]",
                            entry.kind.sql_type(),
                            entry.depth,
                            entry.array_hierarchy.join(", ")
                        );
                    }
                }
                Err(err) => println!("{}", err.to_comment()),
            },

            ShellCommand::Metrics => {
                println!("{}", serde_json::to_string_pretty(&metrics_report())?);
            }

            ShellCommand::Reset => {
                SchemaCache::global().clear();
                metrics_reset_all();
                println!("cache and metrics cleared");
            }
        }
    }

    Ok(())
}
