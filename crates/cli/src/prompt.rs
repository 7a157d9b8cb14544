//! Line-based terminal prompt.

use pyrelease_version::{
    BumpKind, Error, PromptRequest, Result, SpecifierPrompt, VersionSpecifier,
};
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

const CUSTOM: &str = "custom";

/// Asks on stderr and reads one answer per line from `R`.
///
/// The reader is kept for the whole run so input buffered past one answer is
/// still there for the next question.
#[derive(Debug)]
pub struct LinePrompt<R> {
    input: Mutex<R>,
}

/// Prompt reading answers from stdin.
pub type TerminalPrompt = LinePrompt<BufReader<Stdin>>;

impl TerminalPrompt {
    /// Prompt on the process's stdin.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Prompt reading from `input`.
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

/// What the user typed for the kind question.
#[derive(Debug, PartialEq, Eq)]
enum KindAnswer {
    Kind(BumpKind),
    Custom,
}

fn parse_kind(answer: &str) -> Result<KindAnswer> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case(CUSTOM) {
        return Ok(KindAnswer::Custom);
    }
    BumpKind::parse(&answer.to_lowercase())
        .map(KindAnswer::Kind)
        .ok_or_else(|| Error::prompt(format!("\"{answer}\" is not a valid kind of change")))
}

fn choices() -> String {
    let mut names: Vec<&str> = BumpKind::ALL.iter().map(|kind| kind.as_str()).collect();
    names.push(CUSTOM);
    names.join("/")
}

async fn ask_line<R>(input: &mut R, question: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut stderr = tokio::io::stderr();
    stderr.write_all(question.as_bytes()).await?;
    stderr.write_all(b" ").await?;
    stderr.flush().await?;

    let mut line = String::new();
    let read = input.read_line(&mut line).await?;
    if read == 0 {
        return Err(Error::prompt("stdin closed before an answer was given"));
    }
    Ok(line.trim().to_string())
}

impl<R> SpecifierPrompt for LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn ask<'a>(
        &'a self,
        request: &'a PromptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<VersionSpecifier>> + Send + 'a>> {
        Box::pin(async move {
            let mut input = self.input.lock().await;
            let question = format!("{} [{}]", request.kind_question, choices());
            match parse_kind(&ask_line(&mut *input, &question).await?)? {
                KindAnswer::Kind(kind) => Ok(VersionSpecifier::Bump(kind)),
                KindAnswer::Custom => {
                    let exact = ask_line(&mut *input, &request.exact_question).await?;
                    exact.parse()
                }
            }
        })
    }
}
