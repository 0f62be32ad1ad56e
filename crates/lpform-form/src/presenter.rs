use std::fmt;

use lpform_model::{Cell, ProblemRequest, SolveResult, SolveStatus, Tableau};

pub const NOT_AVAILABLE: &str = "N/A";

/// Follow-on actions offered next to a rendered result
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actions {
    /// Only for problems with exactly two decision variables
    pub export_graph: bool,
    pub export_report: bool,
    pub view_tableaux: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    pub status: SolveStatus,
    pub status_label: String,
    pub objective_value: String,
    /// Decision variables only, ordered by index, values formatted
    pub variables: Vec<(String, String)>,
    pub actions: Actions,
}

/// Map a solver result to what the user sees.
///
/// `solved` is the request the result answers (the persisted one), not the
/// live form: the graph action has to match the problem actually solved.
pub fn present(result: &SolveResult, solved: Option<&ProblemRequest>) -> DisplayModel {
    let objective_value = result
        .objective_value()
        .map(format_value)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut variables: Vec<(usize, &String, f64)> = result
        .variable_values()
        .into_iter()
        .flatten()
        .filter_map(|(name, &value)| decision_index(name).map(|i| (i, name, value)))
        .collect();
    variables.sort_by_key(|&(i, _, _)| i);

    DisplayModel {
        status: result.status(),
        status_label: result.status().label().to_string(),
        objective_value,
        variables: variables
            .into_iter()
            .map(|(_, name, value)| (name.clone(), format_value(value)))
            .collect(),
        actions: Actions {
            export_graph: solved.is_some_and(ProblemRequest::is_plottable),
            export_report: true,
            view_tableaux: result.status() == SolveStatus::Optimal && !result.tableaux().is_empty(),
        },
    }
}

pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// `x<i>` names a decision variable; anything else (slacks, artificials) is
/// solver bookkeeping.
fn decision_index(name: &str) -> Option<usize> {
    name.strip_prefix('x')?.parse().ok()
}

impl fmt::Display for DisplayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status:          {}", self.status_label)?;
        writeln!(f, "Objective value: {}", self.objective_value)?;
        if !self.variables.is_empty() {
            writeln!(f, "Variables:")?;
            for (name, value) in &self.variables {
                writeln!(f, "  {:8} {:>12}", name, value)?;
            }
        }
        Ok(())
    }
}

/// Render one simplex iteration as an aligned text table
pub fn render_tableau(tableau: &Tableau) -> String {
    let mut lines: Vec<Vec<String>> = Vec::with_capacity(tableau.rows.len() + 2);
    lines.push(tableau.headers.clone());
    lines.extend(tableau.rows.iter().map(|row| row.iter().map(render_cell).collect()));
    lines.push(tableau.objective_row.iter().map(render_cell).collect());

    let columns = lines.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            lines
                .iter()
                .filter_map(|line| line.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&tableau.title);
    out.push('\n');
    let last = lines.len() - 1;
    for (i, line) in lines.iter().enumerate() {
        if i == last {
            let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
            out.push_str(&"-".repeat(rule));
            out.push('\n');
        }
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:>w$}", cell, w = w))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => format_value(*v),
        Cell::Text(s) => s.clone(),
        Cell::Empty => String::new(),
    }
}

pub fn present_tableaux(result: &SolveResult) -> Vec<String> {
    result.tableaux().iter().map(render_tableau).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpform_model::{Constraint, Direction, Relation};
    use std::collections::BTreeMap;

    fn request(n: usize) -> ProblemRequest {
        ProblemRequest::new(
            Direction::Maximize,
            vec![1.0; n],
            vec![Constraint::new(vec![1.0; n], Relation::Le, 1.0)],
        )
        .unwrap()
    }

    fn textbook_result() -> SolveResult {
        SolveResult::optimal(
            36.0,
            BTreeMap::from([
                ("x1".to_string(), 2.0),
                ("x2".to_string(), 6.0),
                ("s1".to_string(), 2.0),
            ]),
        )
    }

    #[test]
    fn test_graph_offered_for_two_variables() {
        let model = present(&textbook_result(), Some(&request(2)));
        assert_eq!(model.status_label, "Optimal");
        assert_eq!(model.objective_value, "36.00");
        assert_eq!(
            model.variables,
            vec![("x1".to_string(), "2.00".to_string()), ("x2".to_string(), "6.00".to_string())]
        );
        assert!(model.actions.export_graph);
        assert!(model.actions.export_report);
    }

    #[test]
    fn test_graph_not_offered_for_three_variables() {
        let model = present(&textbook_result(), Some(&request(3)));
        assert!(!model.actions.export_graph);
        assert!(model.actions.export_report);
    }

    #[test]
    fn test_graph_not_offered_without_solved_request() {
        assert!(!present(&textbook_result(), None).actions.export_graph);
    }

    #[test]
    fn test_non_optimal_result_is_displayable() {
        let model = present(&SolveResult::without_solution(SolveStatus::Infeasible), Some(&request(2)));
        assert_eq!(model.status_label, "Infeasible");
        assert_eq!(model.objective_value, NOT_AVAILABLE);
        assert!(model.variables.is_empty());
        assert!(model.actions.export_report);
        assert!(!model.actions.view_tableaux);
    }

    #[test]
    fn test_variables_ordered_by_index() {
        let values = (1..=11).map(|i| (format!("x{}", i), i as f64)).collect();
        let model = present(&SolveResult::optimal(0.0, values), None);
        let names: Vec<&str> = model.variables.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names.first(), Some(&"x1"));
        assert_eq!(names.get(1), Some(&"x2"));
        assert_eq!(names.last(), Some(&"x11"));
    }

    #[test]
    fn test_render_tableau_aligns_columns() {
        let tableau = Tableau {
            title: "Iteration 1".into(),
            headers: vec!["Base".into(), "x1".into(), "RHS".into()],
            rows: vec![vec![Cell::Text("s1".into()), Cell::Number(1.0), Cell::Number(4.0)]],
            objective_row: vec![Cell::Text("Z".into()), Cell::Number(-3.0), Cell::Empty],
        };
        let text = render_tableau(&tableau);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Iteration 1");
        assert_eq!(lines[1], "Base     x1   RHS");
        assert_eq!(lines[2], "  s1   1.00  4.00");
        assert!(lines[3].starts_with("---"));
        assert_eq!(lines[4], "   Z  -3.00");
    }
}
