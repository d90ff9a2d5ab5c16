// Copyright 2025 Janek Bevendorff
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Public suffix lookups based on the list from <https://publicsuffix.org/list/>.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;
use warcreader::value::is_ip_literal;

/// Rule set of the public suffix list.
#[derive(Debug, Clone, Default)]
pub struct PublicSuffixList {
    rules: HashSet<String>,
    /// Parents of `*.` wildcard rules
    wildcards: HashSet<String>,
    /// `!` exception rules without the `!`
    exceptions: HashSet<String>,
}

impl PublicSuffixList {
    /// Load the list from a file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Load the list from a reader in the publicsuffix.org text format.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut list = Self::default();
        for line in reader.lines() {
            list.add_rule(&line?);
        }
        debug!(
            "Loaded {} public suffix rules",
            list.rules.len() + list.wildcards.len() + list.exceptions.len()
        );
        Ok(list)
    }

    fn add_rule(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return;
        }
        let Some(rule) = line.split_whitespace().next() else {
            return;
        };
        let rule = rule.to_lowercase();
        if let Some(exception) = rule.strip_prefix('!') {
            self.exceptions.insert(exception.to_string());
        } else if let Some(parent) = rule.strip_prefix("*.") {
            self.wildcards.insert(parent.to_string());
        } else {
            self.rules.insert(rule);
        }
    }

    /// Number of rules in the list.
    pub fn len(&self) -> usize {
        self.rules.len() + self.wildcards.len() + self.exceptions.len()
    }

    /// Public suffix of a host name (`amazon.co.uk` becomes `co.uk`).
    ///
    /// Hosts without a matching rule fall back to their last label. IP
    /// addresses and empty hosts have no public suffix.
    pub fn suffix(&self, host: &str) -> String {
        let host = host.trim_end_matches('.').to_lowercase();
        if host.is_empty() || is_ip_literal(&host) {
            return String::new();
        }

        let labels: Vec<&str> = host.split('.').collect();
        for i in 0..labels.len() {
            let candidate = labels[i..].join(".");
            if self.exceptions.contains(&candidate) {
                return labels[i + 1..].join(".");
            }
            if self.rules.contains(&candidate) {
                return candidate;
            }
            if i + 1 < labels.len() && self.wildcards.contains(&labels[i + 1..].join(".")) {
                return candidate;
            }
        }
        labels.last().copied().unwrap_or_default().to_string()
    }
}
