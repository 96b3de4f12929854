// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::{Result, VcdWriteError};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Timescale {
    pub factor: u32,
    pub unit: TimescaleUnit,
}

impl Timescale {
    pub fn new(factor: u32, unit: TimescaleUnit) -> Self {
        Timescale { factor, unit }
    }

    /// VCD only knows about factors of 1, 10 and 100.
    pub(crate) fn check(&self) -> Result<()> {
        match self.factor {
            1 | 10 | 100 => Ok(()),
            other => Err(VcdWriteError::InvalidTimescaleFactor(other)),
        }
    }
}

impl std::fmt::Display for Timescale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.factor, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum TimescaleUnit {
    FemtoSeconds,
    PicoSeconds,
    NanoSeconds,
    MicroSeconds,
    MilliSeconds,
    Seconds,
}

impl TimescaleUnit {
    pub fn as_str(&self) -> &'static str {
        match &self {
            TimescaleUnit::FemtoSeconds => "fs",
            TimescaleUnit::PicoSeconds => "ps",
            TimescaleUnit::NanoSeconds => "ns",
            TimescaleUnit::MicroSeconds => "us",
            TimescaleUnit::MilliSeconds => "ms",
            TimescaleUnit::Seconds => "s",
        }
    }
}

impl std::fmt::Display for TimescaleUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimescaleUnit {
    type Err = VcdWriteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fs" => Ok(TimescaleUnit::FemtoSeconds),
            "ps" => Ok(TimescaleUnit::PicoSeconds),
            "ns" => Ok(TimescaleUnit::NanoSeconds),
            "us" => Ok(TimescaleUnit::MicroSeconds),
            "ms" => Ok(TimescaleUnit::MilliSeconds),
            "s" => Ok(TimescaleUnit::Seconds),
            other => Err(VcdWriteError::InvalidTimescaleUnit(other.to_string())),
        }
    }
}

/// The subset of VCD variable types that we emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum VarType {
    Wire,
    Reg,
}

impl VarType {
    pub fn as_str(&self) -> &'static str {
        match &self {
            VarType::Wire => "wire",
            VarType::Reg => "reg",
        }
    }
}

/// Splits a hierarchical name into its components. Empty components, e.g. from repeated
/// separators, are skipped. The last component is the name of the variable.
pub fn split_hierarchy(hier_name: &str, separator: char) -> Vec<&str> {
    hier_name
        .split(separator)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Tracks which scopes are currently open in the output.
///
/// Moving to a new scope chain closes and opens the minimal number of scopes. This only
/// produces a well formed hierarchy if all variables of a scope are declared contiguously
/// (pre-order). A scope that is re-entered after being closed is emitted a second time.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    current: Vec<String>,
}

impl ScopeStack {
    /// Appends the `$upscope` and `$scope` commands required to go from the currently open
    /// scopes to `target`. Everything below the longest common prefix is closed, even if a
    /// deeper scope happens to share its name with the target. Returns the number of emitted
    /// commands.
    pub(crate) fn transition<S: AsRef<str>>(&mut self, target: &[S], out: &mut String) -> usize {
        let common = self
            .current
            .iter()
            .zip(target.iter())
            .take_while(|(open, wanted)| open.as_str() == wanted.as_ref())
            .count();
        let mut commands = 0;
        while self.current.len() > common {
            out.push_str("$upscope $end\n");
            self.current.pop();
            commands += 1;
        }
        while self.current.len() < target.len() {
            let name = target[self.current.len()].as_ref();
            out.push_str("$scope module ");
            out.push_str(name);
            out.push_str(" $end\n");
            self.current.push(name.to_string());
            commands += 1;
        }
        commands
    }

    /// Closes all open scopes.
    pub(crate) fn close_all(&mut self, out: &mut String) -> usize {
        self.transition::<&str>(&[], out)
    }
}
