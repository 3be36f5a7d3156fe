//! NDJSON line protocol spoken by the Python bootstrap.
//!
//! The bootstrap reads the user source from stdin and reports everything on
//! its real stdout, one JSON object per line: stream chunks while the script
//! runs, then exactly one terminal `result` or `error` event.

use serde::Deserialize;

/// One decoded protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    Stdout(String),
    Stderr(String),
    /// Script finished; `repr` of the final expression, `None` when the
    /// script ended in a statement or evaluated to Python `None`.
    Result(Option<String>),
    Error(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Wire {
    Stream { stream: StreamName, text: String },
    Terminal(TerminalWire),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StreamName {
    Stdout,
    Stderr,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum TerminalWire {
    Result { value: Option<String> },
    Error { message: String },
}

/// Decode one protocol line. Malformed lines yield `None` and are ignored
/// by the reader, same as stray interpreter noise on stdout.
pub fn parse_line(line: &str) -> Option<RuntimeEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Wire>(line).ok()? {
        Wire::Stream { stream, text } => Some(match stream {
            StreamName::Stdout => RuntimeEvent::Stdout(text),
            StreamName::Stderr => RuntimeEvent::Stderr(text),
        }),
        Wire::Terminal(TerminalWire::Result { value }) => Some(RuntimeEvent::Result(value)),
        Wire::Terminal(TerminalWire::Error { message }) => Some(RuntimeEvent::Error(message)),
    }
}

/// Bootstrap program passed to `python -c`. Line-buffers the script's stdout
/// and stderr so each printed line becomes one stream event, evaluates a
/// trailing expression REPL-style, and never lets an exception escape as a
/// raw traceback.
pub const BOOTSTRAP: &str = r#"
import ast
import io
import json
import sys
import traceback

def emit(obj):
    sys.__stdout__.write(json.dumps(obj) + "\n")
    sys.__stdout__.flush()

class LinePipe(io.TextIOBase):
    def __init__(self, name):
        self.name = name
        self.buf = ""

    def writable(self):
        return True

    def write(self, text):
        self.buf += text
        while "\n" in self.buf:
            line, self.buf = self.buf.split("\n", 1)
            emit({"stream": self.name, "text": line})
        return len(text)

    def drain(self):
        if self.buf:
            emit({"stream": self.name, "text": self.buf})
            self.buf = ""

source = sys.stdin.read()
out = LinePipe("stdout")
err = LinePipe("stderr")
sys.stdout = out
sys.stderr = err
env = {"__name__": "__main__"}
try:
    tree = ast.parse(source, "<playground>", "exec")
    tail = None
    if tree.body and isinstance(tree.body[-1], ast.Expr):
        tail = ast.Expression(tree.body.pop().value)
    exec(compile(tree, "<playground>", "exec"), env)
    value = None
    if tail is not None:
        value = eval(compile(tail, "<playground>", "eval"), env)
    out.drain()
    err.drain()
    emit({"event": "result", "value": None if value is None else repr(value)})
except BaseException:
    etype, evalue, _tb = sys.exc_info()
    message = "".join(traceback.format_exception_only(etype, evalue)).strip()
    out.drain()
    err.drain()
    emit({"event": "error", "message": message})
"#;
