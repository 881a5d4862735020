use rustc_hash::FxHashSet;

use super::{BuildEdge, Manifest, ManifestError, Rule, Statement};

/// Collects manifest statements in emission order and validates them on
/// [`finish`](ManifestBuilder::finish).
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    statements: Vec<Statement>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.statements.push(Statement::Variable(name.into(), value.into()));
        self
    }

    pub fn rule(&mut self, rule: Rule) -> &mut Self {
        self.statements.push(Statement::Rule(rule));
        self
    }

    pub fn edge(&mut self, edge: BuildEdge) -> &mut Self {
        self.statements.push(Statement::Edge(edge));
        self
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.statements.push(Statement::Comment(text.into()));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.statements.push(Statement::Blank);
        self
    }

    pub fn finish(self) -> Result<Manifest, ManifestError> {
        let mut rules: FxHashSet<&str> = FxHashSet::default();
        let mut outputs: FxHashSet<&str> = FxHashSet::default();

        for stmt in &self.statements {
            match stmt {
                Statement::Variable(name, value) => {
                    check_name("variable", name)?;
                    check_value(name, value, "top-level scope")?;
                }
                Statement::Rule(rule) => {
                    check_name("rule", &rule.name)?;
                    let context = format!("rule `{}`", rule.name);
                    check_value("command", &rule.command, &context)?;
                    if let Some(depfile) = &rule.depfile {
                        check_value("depfile", depfile, &context)?;
                    }
                    if !rules.insert(rule.name.as_str()) {
                        return Err(ManifestError::DuplicateRule {
                            rule: rule.name.clone(),
                        });
                    }
                }
                Statement::Edge(edge) => {
                    check_edge(edge, &rules)?;
                    if !outputs.insert(edge.output.as_str()) {
                        return Err(ManifestError::DuplicateOutput {
                            output: edge.output.clone(),
                            origin: edge.origin.clone(),
                        });
                    }
                }
                Statement::Comment(_) | Statement::Blank => {}
            }
        }

        // Order-only prerequisites may be produced later in the file.
        for stmt in &self.statements {
            if let Statement::Edge(edge) = stmt
                && let Some(missing) = edge.order_only.iter().find(|dep| !outputs.contains(dep.as_str()))
            {
                return Err(ManifestError::UndeclaredOrderOnly {
                    dependency: missing.clone(),
                    output: edge.output.clone(),
                    origin: edge.origin.clone(),
                });
            }
        }

        tracing::debug!(
            rules = rules.len(),
            edges = outputs.len(),
            "manifest passed integrity checks"
        );
        Ok(Manifest {
            statements: self.statements,
        })
    }
}

fn check_edge(edge: &BuildEdge, rules: &FxHashSet<&str>) -> Result<(), ManifestError> {
    let paths = std::iter::once(&edge.output)
        .chain(edge.inputs.iter())
        .chain(edge.order_only.iter());
    for path in paths {
        if !is_valid_path(path) {
            return Err(ManifestError::MalformedPath {
                path: path.clone(),
                output: edge.output.clone(),
                origin: edge.origin.clone(),
            });
        }
    }

    if !rules.contains(edge.rule.as_str()) {
        return Err(ManifestError::UnknownRule {
            rule: edge.rule.clone(),
            output: edge.output.clone(),
            origin: edge.origin.clone(),
        });
    }

    let context = format!("build edge `{}`", edge.output);
    for (name, value) in &edge.variables {
        check_name("variable", name)?;
        check_value(name, value, &context)?;
    }
    Ok(())
}

fn check_name(kind: &'static str, name: &str) -> Result<(), ManifestError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ManifestError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

fn check_value(name: &str, value: &str, context: &str) -> Result<(), ManifestError> {
    if value.contains(['\n', '\r']) {
        Err(ManifestError::MalformedValue {
            name: name.to_string(),
            context: context.to_string(),
        })
    } else {
        Ok(())
    }
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && !path.chars().any(|c| c.is_whitespace() || matches!(c, ':' | '|' | '$' | '#'))
}
