//! # Repository Selection
//!
//! A selector produces the list of repository URIs a run operates on. The
//! concrete sources are a fixed list, newline-delimited files, standard
//! input, and the GitHub API (see [`crate::github`]).
//!
//! The CLI describes selectors with a `slug:content` expression, e.g.
//! `file:repos.txt`, `stdin`, or `org-repo-prefix:my-org/service-`, parsed
//! by [`parse_expression`].

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use regex::Regex;

use crate::error::{Error, Result};
use crate::github::GitHubOrgSelector;

/// Produces the list of repository URIs to operate on.
pub trait RepositorySelector: Send + Sync {
    /// Resolve the list of repository URIs.
    fn uris(&self) -> Result<Vec<String>>;
}

/// A selector backed by a fixed list of URIs.
#[derive(Debug, Clone)]
pub struct StaticSelector {
    uris: Vec<String>,
}

impl StaticSelector {
    pub fn new<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uris: uris.into_iter().map(Into::into).collect(),
        }
    }
}

impl RepositorySelector for StaticSelector {
    fn uris(&self) -> Result<Vec<String>> {
        Ok(self.uris.clone())
    }
}

/// Reads URIs from one or more newline-delimited files, skipping blank
/// lines. The files are validated when the selector is constructed so that
/// a bad path fails before any run work starts.
#[derive(Debug, Clone)]
pub struct FileSelector {
    paths: Vec<PathBuf>,
}

impl FileSelector {
    pub fn new(paths: Vec<PathBuf>) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::Selection {
                message: "no selector files were given".to_string(),
            });
        }
        for path in &paths {
            if !path.exists() {
                return Err(Error::Selection {
                    message: format!("file {} does not exist", path.display()),
                });
            }
            if !path.is_file() {
                return Err(Error::Selection {
                    message: format!("{} is not a regular file", path.display()),
                });
            }
            fs::File::open(path).map_err(|e| Error::Selection {
                message: format!("file {} is not readable: {}", path.display(), e),
            })?;
        }
        Ok(Self { paths })
    }
}

impl RepositorySelector for FileSelector {
    fn uris(&self) -> Result<Vec<String>> {
        let mut uris = Vec::new();
        for path in &self.paths {
            let content = fs::read_to_string(path).map_err(|e| Error::Selection {
                message: format!("could not read {}: {}", path.display(), e),
            })?;
            uris.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(uris)
    }
}

/// Reads newline-delimited URIs from standard input, skipping blank lines.
#[derive(Debug, Default)]
pub struct StdinSelector;

impl RepositorySelector for StdinSelector {
    fn uris(&self) -> Result<Vec<String>> {
        let mut uris = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line.map_err(|e| Error::Selection {
                message: format!("could not read standard input: {}", e),
            })?;
            let line = line.trim();
            if !line.is_empty() {
                uris.push(line.to_string());
            }
        }
        Ok(uris)
    }
}

/// Parse a `slug:content` selector expression into a selector.
///
/// Supported forms:
/// - `org-repo-prefix:ORG/PREFIX` - GitHub repositories of ORG whose name
///   starts with PREFIX (requires an access token)
/// - `file:PATH[;PATH...]` - newline-delimited URI files
/// - `stdin` - newline-delimited URIs on standard input
pub fn parse_expression(
    expr: &str,
    access_token: Option<&str>,
) -> Result<Box<dyn RepositorySelector>> {
    let pattern = Regex::new(r"^([\w-]+)(?::(.*))?$").expect("selector expression pattern");
    let captures = pattern.captures(expr.trim()).ok_or_else(|| Error::Selection {
        message: format!(
            "invalid selector expression {:?}; expected \"selector-type[:expression]\"",
            expr
        ),
    })?;
    let slug = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let content = captures.get(2).map(|m| m.as_str());

    match slug {
        "org-repo-prefix" => parse_org_repo_prefix(content, access_token),
        "file" => {
            let content = content.filter(|c| !c.is_empty()).ok_or_else(|| Error::Selection {
                message: "no file paths were given".to_string(),
            })?;
            let paths = content.split(';').map(PathBuf::from).collect();
            Ok(Box::new(FileSelector::new(paths)?))
        }
        "stdin" => Ok(Box::new(StdinSelector)),
        other => Err(Error::Selection {
            message: format!("unsupported selector type {:?}", other),
        }),
    }
}

fn parse_org_repo_prefix(
    content: Option<&str>,
    access_token: Option<&str>,
) -> Result<Box<dyn RepositorySelector>> {
    let content = content.filter(|c| !c.is_empty()).ok_or_else(|| Error::Selection {
        message: "missing required selector expression".to_string(),
    })?;
    let token = access_token.ok_or_else(|| Error::Selection {
        message: "the org-repo-prefix selector requires an access token".to_string(),
    })?;
    let pattern = Regex::new(r"^(.+)/(.+)$").expect("org/prefix pattern");
    let captures = pattern.captures(content).ok_or_else(|| Error::Selection {
        message: format!(
            "invalid content {:?} for org-repo-prefix selector; expected \"orgName/prefix\"",
            content
        ),
    })?;
    Ok(Box::new(GitHubOrgSelector::new(
        &captures[1],
        &captures[2],
        token,
    )))
}
