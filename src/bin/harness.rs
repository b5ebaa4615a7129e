//! Command-line test harness (§6) — out of scope for the core heap engine,
//! but the external driver that exercises it end-to-end. Accepts one or
//! more named scenarios with optional `key=value` parameters and an
//! optional `--verbose` switch that dumps regions, blocks, and buckets
//! after each scenario.
//!
//! Exit code 0 on success, non-zero on assertion failure or a malformed
//! scenario argument.

use std::collections::HashMap;
use std::mem;

use anyhow::{Context, Result};
use clap::Parser;
use segalloc::Heap;

#[derive(Parser)]
#[command(
  name = "segalloc-harness",
  about = "Exercises the segalloc heap engine against the scenarios in spec.md §8"
)]
struct Args {
  /// One or more scenario tokens, e.g. `alignment` or `growth:count=70,size=100`.
  #[arg(required = true)]
  scenarios: Vec<String>,

  /// Dump regions, blocks, and buckets after each scenario.
  #[arg(long)]
  verbose: bool,
}

#[derive(thiserror::Error, Debug)]
enum HarnessError {
  #[error("unknown scenario `{0}`")]
  UnknownScenario(String),
  #[error("malformed key=value parameter `{0}`")]
  MalformedParam(String),
  #[error("parameter `{0}` is not a valid number: {1}")]
  InvalidNumber(String, std::num::ParseIntError),
  #[error("scenario assertion failed: {0}")]
  AssertionFailed(String),
}

struct Scenario {
  name: String,
  params: HashMap<String, usize>,
}

fn parse_scenario(token: &str) -> Result<Scenario, HarnessError> {
  let (name, rest) = match token.split_once(':') {
    Some((n, r)) => (n, Some(r)),
    None => (token, None),
  };

  let mut params = HashMap::new();
  if let Some(rest) = rest {
    for pair in rest.split(',') {
      let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| HarnessError::MalformedParam(pair.to_string()))?;
      let value: usize = value
        .parse()
        .map_err(|e| HarnessError::InvalidNumber(key.to_string(), e))?;
      params.insert(key.to_string(), value);
    }
  }

  Ok(Scenario { name: name.to_string(), params })
}

fn run_scenario(scenario: &Scenario, verbose: bool) -> Result<(), HarnessError> {
  let mut heap = Heap::new();

  match scenario.name.as_str() {
    "alignment" => {
      unsafe {
        let p = heap.allocate(1);
        if p.is_null() {
          return Err(HarnessError::AssertionFailed("allocate(1) returned null".into()));
        }
        if !(p as usize).is_multiple_of(mem::size_of::<usize>()) {
          return Err(HarnessError::AssertionFailed("pointer is not word-aligned".into()));
        }
        heap.release(p);
      }
    }
    "reuse" => unsafe {
      let p1 = heap.allocate(64);
      heap.release(p1);
      let p2 = heap.allocate(64);
      if p1 != p2 {
        return Err(HarnessError::AssertionFailed("freed block was not reused".into()));
      }
    },
    "coalesce" => unsafe {
      let a = heap.allocate(4);
      let b = heap.allocate(4);
      let c = heap.allocate(4);
      heap.release(a);
      heap.release(c);
      heap.release(b);
      let p = heap.allocate(12 * mem::size_of::<i32>());
      if p.is_null() {
        return Err(HarnessError::AssertionFailed(
          "allocation after coalescing adjacent free blocks returned null".into(),
        ));
      }
    },
    "large-block" => unsafe {
      let n = scenario.params.get("size").copied().unwrap_or(256 * 1024);
      let p = heap.allocate(n);
      if p.is_null() {
        return Err(HarnessError::AssertionFailed("large allocation returned null".into()));
      }
      std::ptr::write_bytes(p, 0xAB, n);
      heap.release(p);
    },
    "growth" => unsafe {
      let count = scenario.params.get("count").copied().unwrap_or(70);
      let size = scenario.params.get("size").copied().unwrap_or(100);
      for _ in 0..count {
        let p = heap.allocate(size);
        if p.is_null() {
          return Err(HarnessError::AssertionFailed(format!(
            "allocate({size}) returned null during growth scenario"
          )));
        }
      }
    },
    "fragmentation" => unsafe {
      let mut larges = Vec::new();
      for _ in 0..10 {
        let l = heap.allocate(512);
        let s = heap.allocate(64);
        let m = heap.allocate(256);
        if l.is_null() || s.is_null() || m.is_null() {
          return Err(HarnessError::AssertionFailed("fragmentation setup allocation failed".into()));
        }
        heap.release(m);
        larges.push(l);
      }
      for l in larges {
        heap.release(l);
      }
      for _ in 0..10 {
        let p = heap.allocate(256);
        if p.is_null() {
          return Err(HarnessError::AssertionFailed("allocate(256) failed after fragmentation".into()));
        }
        heap.release(p);
      }
    },
    other => return Err(HarnessError::UnknownScenario(other.to_string())),
  }

  if verbose {
    println!("--- {} ---", scenario.name);
    println!("{}", segalloc::debug::render(&heap));
  }

  Ok(())
}

fn main() -> Result<()> {
  let args = Args::parse();

  for token in &args.scenarios {
    let scenario = parse_scenario(token).with_context(|| format!("parsing scenario `{token}`"))?;
    run_scenario(&scenario, args.verbose).with_context(|| format!("running scenario `{}`", scenario.name))?;
    println!("{}: ok", scenario.name);
  }

  Ok(())
}
