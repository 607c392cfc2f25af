//! Scripted `kubectl` stand-in shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use rollout_sync::{CommandRunner, ExecError, Sleeper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Out(String),
    Fail(String),
}

pub fn out(s: &str) -> Reply {
    Reply::Out(s.to_string())
}

pub fn fail(s: &str) -> Reply {
    Reply::Fail(s.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Capture(Vec<String>),
    Stream(Vec<String>),
    Sleep(Duration),
}

impl Call {
    pub fn args(&self) -> &[String] {
        match self {
            Call::Capture(args) | Call::Stream(args) => args,
            Call::Sleep(_) => &[],
        }
    }

    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        let args = self.args();
        args.len() >= prefix.len() && args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

struct Rule {
    needle: Vec<String>,
    replies: Vec<Reply>,
    served: usize,
}

/// Replies to calls whose arguments contain every token of a rule's needle.
/// The longest matching needle wins; unmatched calls succeed with no output.
/// Also implements [`Sleeper`], recording sleeps in the same timeline.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    pub fn on(self, needle: &[&str], reply: Reply) -> Self {
        self.on_sequence(needle, vec![reply])
    }

    /// Replies in order; the last reply repeats.
    pub fn on_sequence(self, needle: &[&str], replies: Vec<Reply>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.iter().map(|s| s.to_string()).collect(),
            replies,
            served: 0,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, needle: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|call| needle.iter().all(|n| call.args().iter().any(|a| a == n)))
            .count()
    }

    fn reply(&self, args: &[String]) -> Reply {
        let mut rules = self.rules.lock().unwrap();
        let best = rules
            .iter_mut()
            .filter(|rule| rule.needle.iter().all(|n| args.contains(n)))
            .max_by_key(|rule| rule.needle.len());
        match best {
            Some(rule) => {
                let index = rule.served.min(rule.replies.len() - 1);
                rule.served += 1;
                rule.replies[index].clone()
            }
            None => Reply::Out(String::new()),
        }
    }

    fn answer(&self, args: &[String]) -> Result<String, ExecError> {
        match self.reply(args) {
            Reply::Out(stdout) => Ok(stdout),
            Reply::Fail(stderr) => Err(ExecError::Failed {
                command: format!("kubectl {}", args.join(" ")),
                status: "exit status: 1".to_string(),
                stderr,
            }),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn capture(&self, program: &str, args: &[String]) -> Result<String, ExecError> {
        assert_eq!(program, "kubectl");
        self.calls.lock().unwrap().push(Call::Capture(args.to_vec()));
        self.answer(args)
    }

    fn stream(&self, program: &str, args: &[String]) -> Result<(), ExecError> {
        assert_eq!(program, "kubectl");
        self.calls.lock().unwrap().push(Call::Stream(args.to_vec()));
        self.answer(args).map(|_| ())
    }
}

impl Sleeper for ScriptedRunner {
    fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(Call::Sleep(duration));
    }
}

pub fn argv(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
