/*****************************************************************************************[dimacs.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::{interface::SolverInterface, ELit, Status},
    std::io::{self, BufRead},
};

/// `parse(input, solver)` adds the content of `input` to the solver
///
/// Clauses get their position in the file as id, starting at 1, so the ids
/// reported by core traversals refer back to the input. Repeated literals
/// are merged and tautologies skipped (they still use up an id).
///
/// ## Params
/// - `is_strict` if true, will fail if number of clauses does not match the declared header
/// - `incremental` if true, accept the [.icnf format](http://www.siert.nl/icnf/):
///   every `a` line solves under its literals and prints the result
pub fn parse<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    is_strict: bool,
    incremental: bool,
) -> io::Result<()> {
    let mut lits = vec![];
    let mut num_clauses = 0;
    let mut num_read_clauses = 0;
    loop {
        skip_whitespace(input)?;
        let ch = next_byte(input)?;
        if ch == Some(b'p') {
            if incremental {
                skip_line(input)?;
                continue;
            }
            let mut header = [0; 5];
            input.read_exact(&mut header)?;
            if &header != b"p cnf" {
                return parse_error(format!("PARSE ERROR! Unexpected char: p"));
            }
            parse_int(input)?;
            num_clauses = parse_int(input)?;
        } else if ch == Some(b'c') {
            skip_line(input)?;
        } else if incremental && ch == Some(b'a') {
            input.consume(1); // skip 'a'
            read_clause(input, &mut lits)?;
            debug!("solve with assumptions {:?}", &lits);
            for &lit in &lits {
                solver.assume(lit);
            }
            match solver.solve() {
                Status::Sat => println!("SAT"),
                Status::Unsat => println!("UNSAT"),
                _ => println!("UNKNOWN"),
            }
        } else if ch.is_some() {
            read_clause(input, &mut lits)?;
            num_read_clauses += 1;
            lits.sort_unstable();
            lits.dedup();
            // `x` and `-x` are adjacent once sorted
            if lits.windows(2).any(|w| w[0].var_idx() == w[1].var_idx()) {
                trace!("skipping tautology {}", num_read_clauses);
                continue;
            }
            solver.add_clause_with_id(num_read_clauses as u32, &lits);
        } else {
            break;
        }
    }
    if is_strict && !incremental && num_clauses != num_read_clauses {
        return parse_error(format!(
            "PARSE ERROR! DIMACS header mismatch: wrong number of clauses"
        ));
    }
    Ok(())
}

fn read_clause<R: BufRead>(input: &mut R, lits: &mut Vec<ELit>) -> io::Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        lits.push(ELit::from_dimacs(parsed_lit));
    }
}

fn parse_int<R: BufRead>(input: &mut R) -> io::Result<i32> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    if let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char));
        }
    } else {
        return parse_error(format!("PARSE ERROR! Unexpected EOF"));
    };
    let mut val: i32 = 0;
    while let Some(ch) = next_byte(input)? {
        if !(b'0' <= ch && ch <= b'9') {
            break;
        }
        input.consume(1);
        val = match val.checked_mul(10).and_then(|v| v.checked_add((ch - b'0') as i32)) {
            Some(v) => v,
            None => return parse_error(format!("PARSE ERROR! Integer too large")),
        };
    }
    if neg {
        Ok(-val)
    } else {
        Ok(val)
    }
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map(|ch| b'\x09' <= ch && ch <= b'\x0d' || ch == b' ')
        .unwrap_or(false)
}

fn skip_whitespace<R: BufRead>(input: &mut R) -> io::Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    loop {
        if let Some(ch) = next_byte(input)? {
            input.consume(1);
            if ch == b'\n' {
                return Ok(());
            }
        } else {
            return Ok(());
        }
    }
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    Ok(input.fill_buf()?.first().map(|&ch| ch))
}

fn parse_error<T>(message: String) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidInput, message))
}
