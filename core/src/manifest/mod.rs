//! Structured ninja manifest model.
//!
//! Rules and build edges are kept as records instead of string templates so
//! that referential integrity can be checked before anything is written. A
//! [`Manifest`] can only be obtained through [`ManifestBuilder::finish`],
//! which rejects unknown rules, duplicate outputs and order-only
//! prerequisites that nothing builds.

mod assemble;
mod builder;
mod error;
mod skeleton;


use std::fmt;

pub use assemble::{assemble, write_manifest};
pub use builder::ManifestBuilder;
pub use error::ManifestError;
pub use skeleton::{CONFORMANCE_CHECKER, TEST_BINARIES, emit_skeleton};

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub command: String,
    pub depfile: Option<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            depfile: None,
        }
    }

    pub fn with_depfile(mut self, depfile: impl Into<String>) -> Self {
        self.depfile = Some(depfile.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEdge {
    pub output: String,
    pub rule: String,
    pub inputs: Vec<String>,
    pub order_only: Vec<String>,
    pub variables: Vec<(String, String)>,
    /// Human readable origin used in diagnostics, e.g. the matrix cell.
    pub origin: Option<String>,
}

impl BuildEdge {
    pub fn new(output: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            rule: rule.into(),
            inputs: Vec::new(),
            order_only: Vec::new(),
            variables: Vec::new(),
            origin: None,
        }
    }

    pub fn input(mut self, path: impl Into<String>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn order_only<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_only.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Statement {
    Variable(String, String),
    Rule(Rule),
    Edge(BuildEdge),
    Comment(String),
    Blank,
}

/// A validated manifest, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    statements: Vec<Statement>,
}

impl Manifest {
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Statement::Rule(rule) => Some(rule),
            _ => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &BuildEdge> {
        self.statements.iter().filter_map(|stmt| match stmt {
            Statement::Edge(edge) => Some(edge),
            _ => None,
        })
    }

    pub fn edge(&self, output: &str) -> Option<&BuildEdge> {
        self.edges().find(|edge| edge.output == output)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            match stmt {
                Statement::Variable(name, value) => write_binding(f, "", name, value)?,
                Statement::Rule(rule) => {
                    writeln!(f, "rule {}", rule.name)?;
                    if let Some(depfile) = &rule.depfile {
                        writeln!(f, "{INDENT}depfile = {}", depfile)?;
                    }
                    writeln!(f, "{INDENT}command = {}", rule.command)?;
                }
                Statement::Edge(edge) => {
                    write!(f, "build {}: {}", edge.output, edge.rule)?;
                    for input in &edge.inputs {
                        write!(f, " {}", input)?;
                    }
                    if !edge.order_only.is_empty() {
                        f.write_str(" |")?;
                        for dep in &edge.order_only {
                            write!(f, " {}", dep)?;
                        }
                    }
                    f.write_str("\n")?;
                    for (name, value) in &edge.variables {
                        write_binding(f, INDENT, name, value)?;
                    }
                }
                Statement::Comment(text) => writeln!(f, "# {}", text)?,
                Statement::Blank => f.write_str("\n")?,
            }
        }
        Ok(())
    }
}

fn write_binding(f: &mut fmt::Formatter<'_>, indent: &str, name: &str, value: &str) -> fmt::Result {
    if value.is_empty() {
        writeln!(f, "{indent}{name} =")
    } else {
        writeln!(f, "{indent}{name} = {value}")
    }
}
