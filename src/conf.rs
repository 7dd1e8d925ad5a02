/* Copyright (C) 2017-2026 Open Information Security Foundation
 *
 * You can copy, redistribute or modify this Program under the terms of
 * the GNU General Public License version 2 as published by the Free
 * Software Foundation.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * version 2 along with this program; if not, write to the Free Software
 * Foundation, Inc., 51 Franklin Street, Fifth Floor, Boston, MA
 * 02110-1301, USA.
 */

//! Configuration access. The configuration is a YAML document, keys are
//! dotted paths such as `app-layer.protocols.template.enabled`.

use std::path::Path;
use nom7::{
    character::complete::{multispace0, not_line_ending},
    sequence::{preceded, tuple},
    number::complete::double,
    combinator::verify,
    IResult,
};
use thiserror::Error;
use yaml_rust::{Yaml, YamlLoader};

#[derive(Error, Debug)]
pub enum ConfError {
    #[error("failed to open {filename:?}: {source:?}")]
    FileOpen {
        filename: String,
        source: std::io::Error,
    },
    #[error("yaml parse: {0}")]
    YamlScan(#[from] yaml_rust::ScanError),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("invalid memory value for {key}: {reason}")]
    InvalidMemval { key: String, reason: &'static str },
}

fn scalar_to_string(node: &Yaml) -> Option<String> {
    match node {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Real(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Boolean(b) => Some(if *b { "true".to_string() } else { "false".to_string() }),
        _ => None,
    }
}

fn is_true(val: &str) -> bool {
    matches!(val, "1" | "yes" | "true" | "on")
}

fn lookup<'a>(root: &'a Yaml, key: &str) -> Option<&'a Yaml> {
    let mut node = root;
    for part in key.split('.') {
        node = match node {
            Yaml::Hash(h) => h.get(&Yaml::String(part.to_string()))?,
            _ => return None,
        };
    }
    Some(node)
}

/// A loaded configuration document.
#[derive(Debug, Clone)]
pub struct Conf {
    root: Yaml,
}

impl Default for Conf {
    fn default() -> Self {
        Self { root: Yaml::Null }
    }
}

impl Conf {
    /// Load configuration from a YAML string. Only the first document
    /// is used.
    pub fn load_str(input: &str) -> Result<Self, ConfError> {
        let mut docs = YamlLoader::load_from_str(input)?;
        let root = if docs.is_empty() { Yaml::Null } else { docs.swap_remove(0) };
        Ok(Self { root })
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfError> {
        let path = path.as_ref();
        let buf = std::fs::read_to_string(path).map_err(|err| ConfError::FileOpen {
            filename: path.display().to_string(),
            source: err,
        })?;
        Self::load_str(&buf)
    }

    pub fn get_node(&self, key: &str) -> Option<ConfNode> {
        lookup(&self.root, key).map(ConfNode::wrap)
    }

    /// Return the string value of a configuration value.
    pub fn get(&self, key: &str) -> Option<String> {
        match lookup(&self.root, key).and_then(scalar_to_string) {
            Some(val) => Some(val),
            None => {
                SCLogDebug!("Failed to find value for key {}", key);
                None
            }
        }
    }

    /// Return the value of key as a boolean. A value that is not set is
    /// the same as having it set to false.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(val) => is_true(&val),
            None => false,
        }
    }

    /// Return a memory value such as "1.5 mb" in bytes.
    pub fn get_memval(&self, key: &str) -> Result<Option<u64>, ConfError> {
        match self.get(key) {
            Some(val) => get_memval(&val)
                .map(Some)
                .map_err(|reason| ConfError::InvalidMemval { key: key.to_string(), reason }),
            None => Ok(None),
        }
    }
}

/// A borrowed node of the configuration tree.
pub struct ConfNode<'a> {
    pub conf: &'a Yaml,
}

impl<'a> ConfNode<'a> {

    pub fn wrap(conf: &'a Yaml) -> Self {
        return Self { conf }
    }

    pub fn get_child_value(&self, key: &str) -> Option<String> {
        lookup(self.conf, key).and_then(scalar_to_string)
    }

    pub fn get_child_bool(&self, key: &str) -> bool {
        match self.get_child_value(key) {
            Some(val) => is_true(&val),
            None => false,
        }
    }

    pub fn get_child_node(&self, key: &str) -> Option<ConfNode<'a>> {
        lookup(self.conf, key).map(ConfNode::wrap)
    }

}

const BYTE: u64       = 1;
const KILOBYTE: u64   = 1024;
const MEGABYTE: u64   = 1_048_576;
const GIGABYTE: u64   = 1_073_741_824;

/// Helper function to retrieve memory unit from a string slice
///
/// Return value: u64
///
/// # Arguments
///
/// * `unit` - A string slice possibly containing memory unit
fn get_memunit(unit: &str) -> u64 {
    let unit = &unit.to_lowercase()[..];
    match unit {
        "b"     => { BYTE }
        "kb"    => { KILOBYTE }
        "mb"    => { MEGABYTE }
        "gb"    => { GIGABYTE }
        _       => { 0 }
    }
}

/// Parses memory units from human readable form to machine readable
///
/// Return value:
///     Result => Ok(u64)
///            => Err(error string)
///
/// # Arguments
///
/// * `arg` - A string slice that holds the value parsed from the config
pub fn get_memval(arg: &str) -> Result<u64, &'static str> {
    let arg = arg.trim();
    let val: f64;
    let mut unit: &str;
    let mut parser = tuple((preceded(multispace0, double),
                        preceded(multispace0, verify(not_line_ending, |c: &str| c.len() < 3))));
    let r: IResult<&str, (f64, &str)> = parser(arg);
    if let Ok(r) = r {
        val = (r.1).0;
        unit = (r.1).1;
    } else {
        return Err("Error parsing the memory value");
    }
    if unit.is_empty() {
        unit = "B";
    }
    let unit = get_memunit(unit);
    if unit == 0 {
        return Err("Invalid memory unit");
    }
    let res = val * unit as f64;
    Ok(res as u64)
}
