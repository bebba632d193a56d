//! Colored rendering of object files.

use std::fmt::{self, Write};

use jetspider_codegen::compiler::Operand;
use jetspider_codegen::{ObjectFile, Unit};
use owo_colors::OwoColorize;

/// Renders the listing of every unit, colored unless `color` is off.
///
/// The plain form is the object file's `Display` output.
pub fn render(object_file: &ObjectFile, color: bool) -> Result<String, fmt::Error> {
    if !color {
        return Ok(object_file.to_string());
    }

    let mut out = String::new();
    for (i, unit) in object_file.units().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_unit(&mut out, unit)?;
    }
    Ok(out)
}

fn render_unit(out: &mut String, unit: &Unit) -> fmt::Result {
    let header = format!(
        "; {}:{} nargs={} nfixed={}",
        unit.filename(),
        unit.lineno(),
        unit.scope().nargs(),
        unit.scope().nfixed()
    );
    writeln!(out, "{}", header.dimmed())?;

    for (index, insn) in unit.instructions().iter().enumerate() {
        let offset = format!("{:04}", index);
        let name = insn.opcode.name();
        match &insn.operand {
            Some(operand) => {
                let text = unit.format_operand(operand);
                let text = match operand {
                    Operand::Atom(_) => text.yellow().to_string(),
                    Operand::Jump(_) | Operand::Label(_) => text.magenta().to_string(),
                    _ => text.cyan().to_string(),
                };
                writeln!(
                    out,
                    "{}  {} {}",
                    offset.dimmed(),
                    format!("{:<10}", name).green(),
                    text
                )?;
            }
            None => writeln!(out, "{}  {}", offset.dimmed(), name.green())?,
        }
    }
    Ok(())
}
