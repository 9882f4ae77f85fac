//! Source fixtures shared by integration tests and benchmarks

/// Every lowering pass has something to do in this file
pub const KITCHEN_SINK: &str = r#"
import { log } from "./log";

export function summarize(items: number[], label: string) {
    const { first, ...others } = { first: items[0], count: items.length, label };
    const [head, ...tail] = items;
    const doubled = items.map(x => x * 2).filter(x => x > 2);
    const total = doubled.reduce((acc, x) => acc + x, 0);
    const merged = [...doubled, ...tail, head];
    for (const value of merged) {
        const line = `${label}: ${value}`;
        log(line.toUpperCase());
    }
    return { ...others, total, last: merged.at(-1), size: merged.length };
}
"#;

/// A nested loop body exercising loop-scope hoisting
pub const NESTED_LOOPS: &str = r#"
const grid: number[][] = [[1, 2], [3, 4]];
const out = [];
for (let i = 0; i < grid.length; i++) {
    const row = grid[i];
    for (let j = 0; j < row.length; j++) {
        const cell = row[j] * 10;
        out.push(cell);
    }
}
"#;

/// `count` copies of `body`, each wrapped in its own function
pub fn repeated(body: &str, count: usize) -> String {
    (0..count)
        .map(|i| format!("function f{}() {{\n{}\n}}\n", i, body))
        .collect()
}
