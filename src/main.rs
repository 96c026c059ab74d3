//! # stackpdf CLI
//!
//! Usage:
//!   stackpdf input.json -o output.pdf
//!   echo '{ ... }' | stackpdf -o output.pdf
//!   stackpdf --example > report.json
//!
//! Set `RUST_LOG=debug` to follow layout decisions.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("usage: stackpdf [input.json] [-o output.pdf] [--example]");
        return ExitCode::SUCCESS;
    }

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.pdf".to_string());
    let input_path = args
        .iter()
        .enumerate()
        .find(|(i, a)| !a.starts_with('-') && (*i == 0 || args[i - 1] != "-o"))
        .map(|(_, a)| a.clone());

    let input = match read_input(input_path.as_deref()) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("✗ Failed to read input: {e}");
            return ExitCode::FAILURE;
        }
    };

    match stackpdf::render_json(&input) {
        Ok(pdf_bytes) => {
            if let Err(e) = fs::write(&output_path, &pdf_bytes) {
                eprintln!("✗ Failed to write {output_path}: {e}");
                return ExitCode::FAILURE;
            }
            eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn example_report_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Quarterly Report",
    "author": "stackpdf"
  },
  "page": {
    "size": "A4",
    "margin": { "top": 54, "right": 54, "bottom": 54, "left": 54 }
  },
  "children": [
    {
      "type": "Page",
      "children": [
        {
          "type": "HStack",
          "style": { "margin": { "bottom": 18 } },
          "children": [
            {
              "type": "Text",
              "content": "Quarterly Report",
              "style": { "fontSize": 24, "fontWeight": 700, "color": "#1a1a26", "stretch": true }
            },
            {
              "type": "Text",
              "content": "Q3 2026",
              "style": { "fontSize": 12, "color": "#6a737d", "verticalAlign": "Trailing" }
            }
          ]
        },
        {
          "type": "VStack",
          "style": {
            "padding": { "top": 8, "right": 8, "bottom": 8, "left": 8 },
            "backgroundColor": "#f6f8fa",
            "border": { "color": "#d0d7de", "width": 1, "radius": 4 }
          },
          "children": [
            {
              "type": "Text",
              "id": "summary",
              "content": "Revenue grew in every region this quarter. The tables below break the numbers down by product line, and the appendix lists the script used to produce them.",
              "style": { "align": "Justify" }
            }
          ]
        },
        {
          "type": "HStack",
          "style": { "margin": { "top": 12 } },
          "children": [
            { "type": "Text", "content": "Region", "style": { "width": "50%", "fontWeight": 700 } },
            { "type": "Text", "content": "Revenue", "style": { "width": "50%", "fontWeight": 700, "align": "Trailing" } },
            { "type": "Text", "content": "North", "style": { "width": "50%" } },
            { "type": "Text", "content": 1250000, "style": { "width": "50%", "align": "Trailing" } },
            { "type": "Text", "content": "South", "style": { "width": "50%" } },
            { "type": "Text", "content": 980000, "style": { "width": "50%", "align": "Trailing" } }
          ]
        },
        {
          "type": "Text",
          "content": "Appendix",
          "style": { "fontSize": 16, "fontWeight": 700, "margin": { "top": 18, "bottom": 6 }, "href": "https://example.com/appendix" }
        },
        {
          "type": "CodeBlock",
          "language": "rust",
          "source": "// TODO: pull figures from the warehouse\nfn total(rows: &[u64]) -> u64 {\n    rows.iter().sum()\n}",
          "style": { "fontSize": 9, "padding": { "top": 6, "right": 6, "bottom": 6, "left": 6 }, "backgroundColor": "#f6f8fa" }
        }
      ]
    }
  ]
}
"##
}
