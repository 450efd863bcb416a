//! AST-backed feature extraction for statements `sqlparser` accepts.

use compact_str::CompactString;
use indexmap::IndexSet;
use sqlparser::{
    ast::{
        BinaryOperator, Expr, JoinConstraint, JoinOperator, OrderByKind, Query, SetExpr, Statement,
        TableFactor
    },
    dialect::{GenericDialect, MySqlDialect},
    parser::Parser
};

use super::{Predicate, PredicateKind};

/// Features recovered from the AST path.
pub(super) struct AstShape {
    pub tables:           Vec<CompactString>,
    pub where_predicates: Vec<Predicate>,
    pub join_predicates:  Vec<Predicate>,
    pub order_columns:    Vec<CompactString>
}

/// Try to parse and extract. `None` means the caller should fall back to
/// token-level extraction.
pub(super) fn extract(sql: &str) -> Option<AstShape> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql)
        .or_else(|_| Parser::parse_sql(&MySqlDialect {}, sql))
        .ok()?;
    let stmt = statements.into_iter().next()?;

    match stmt {
        Statement::Query(query) => Some(extract_query(&query)),
        Statement::Update(sqlparser::ast::Update {
            table,
            selection,
            ..
        }) => {
            let mut shape = AstShape {
                tables:           vec![clean_name(&table.relation.to_string())],
                where_predicates: Vec::new(),
                join_predicates:  Vec::new(),
                order_columns:    Vec::new()
            };
            if let Some(sel) = selection {
                collect_predicates(&sel, &mut shape.where_predicates);
            }
            Some(shape)
        }
        Statement::Delete(delete) => {
            let mut shape = AstShape {
                tables:           Vec::new(),
                where_predicates: Vec::new(),
                join_predicates:  Vec::new(),
                order_columns:    Vec::new()
            };
            if let sqlparser::ast::FromTable::WithFromKeyword(from_items) = delete.from {
                for item in from_items {
                    shape.tables.push(clean_name(&item.relation.to_string()));
                }
            }
            if let Some(sel) = delete.selection {
                collect_predicates(&sel, &mut shape.where_predicates);
            }
            Some(shape)
        }
        _ => None
    }
}

fn extract_query(query: &Query) -> AstShape {
    let mut tables = IndexSet::new();
    let mut where_predicates = Vec::new();
    let mut join_predicates = Vec::new();
    let mut order_columns = Vec::new();

    extract_set_expr(&query.body, &mut tables, &mut where_predicates, &mut join_predicates);

    if let Some(order_by) = &query.order_by
        && let OrderByKind::Expressions(exprs) = &order_by.kind
    {
        for expr in exprs {
            if let Some((_, column)) = column_ref(&expr.expr) {
                order_columns.push(column);
            }
        }
    }

    AstShape {
        tables: tables.into_iter().collect(),
        where_predicates,
        join_predicates,
        order_columns
    }
}

fn extract_set_expr(
    set_expr: &SetExpr,
    tables: &mut IndexSet<CompactString>,
    where_predicates: &mut Vec<Predicate>,
    join_predicates: &mut Vec<Predicate>
) {
    match set_expr {
        SetExpr::Select(select) => {
            for table in &select.from {
                extract_table_factor(&table.relation, tables);
                for join in &table.joins {
                    extract_table_factor(&join.relation, tables);
                    match &join.join_operator {
                        JoinOperator::Inner(constraint)
                        | JoinOperator::LeftOuter(constraint)
                        | JoinOperator::RightOuter(constraint)
                        | JoinOperator::FullOuter(constraint) => {
                            if let JoinConstraint::On(expr) = constraint {
                                collect_join_columns(expr, join_predicates);
                            }
                        }
                        _ => {}
                    }
                }
            }
            if let Some(selection) = &select.selection {
                collect_predicates(selection, where_predicates);
            }
        }
        SetExpr::SetOperation {
            left,
            right,
            ..
        } => {
            extract_set_expr(left, tables, where_predicates, join_predicates);
            extract_set_expr(right, tables, where_predicates, join_predicates);
        }
        SetExpr::Query(query) => {
            extract_set_expr(&query.body, tables, where_predicates, join_predicates);
        }
        _ => {}
    }
}

fn extract_table_factor(table_factor: &TableFactor, tables: &mut IndexSet<CompactString>) {
    match table_factor {
        TableFactor::Table {
            name, ..
        } => {
            tables.insert(clean_name(&name.to_string()));
        }
        TableFactor::Derived {
            subquery, ..
        } => {
            let mut sub_where = Vec::new();
            let mut sub_join = Vec::new();
            extract_set_expr(&subquery.body, tables, &mut sub_where, &mut sub_join);
        }
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            extract_table_factor(&table_with_joins.relation, tables);
            for join in &table_with_joins.joins {
                extract_table_factor(&join.relation, tables);
            }
        }
        _ => {}
    }
}

/// Walk a WHERE expression collecting column constraints.
fn collect_predicates(expr: &Expr, out: &mut Vec<Predicate>) {
    match expr {
        Expr::BinaryOp {
            left,
            op,
            right
        } => match op {
            BinaryOperator::And | BinaryOperator::Or => {
                collect_predicates(left, out);
                collect_predicates(right, out);
            }
            BinaryOperator::Eq => push_comparison(left, right, PredicateKind::Equality, out),
            BinaryOperator::Gt
            | BinaryOperator::Lt
            | BinaryOperator::GtEq
            | BinaryOperator::LtEq
            | BinaryOperator::NotEq => push_comparison(left, right, PredicateKind::Range, out),
            _ => {}
        },
        Expr::Between {
            expr, ..
        } => {
            if let Some((qualifier, column)) = column_ref(expr) {
                out.push(Predicate {
                    qualifier,
                    column,
                    kind: PredicateKind::Range
                });
            }
        }
        Expr::Like {
            expr, ..
        }
        | Expr::ILike {
            expr, ..
        } => {
            if let Some((qualifier, column)) = column_ref(expr) {
                out.push(Predicate {
                    qualifier,
                    column,
                    kind: PredicateKind::Range
                });
            }
        }
        Expr::InList {
            expr, ..
        }
        | Expr::InSubquery {
            expr, ..
        } => {
            if let Some((qualifier, column)) = column_ref(expr) {
                out.push(Predicate {
                    qualifier,
                    column,
                    kind: PredicateKind::Equality
                });
            }
        }
        Expr::Nested(inner) => collect_predicates(inner, out),
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => {
            if let Some((qualifier, column)) = column_ref(inner) {
                out.push(Predicate {
                    qualifier,
                    column,
                    kind: PredicateKind::Equality
                });
            }
        }
        _ => {}
    }
}

/// A join ON clause yields equality predicates on both sides.
fn collect_join_columns(expr: &Expr, out: &mut Vec<Predicate>) {
    match expr {
        Expr::BinaryOp {
            left,
            op,
            right
        } => match op {
            BinaryOperator::And => {
                collect_join_columns(left, out);
                collect_join_columns(right, out);
            }
            BinaryOperator::Eq => {
                for side in [left, right] {
                    if let Some((qualifier, column)) = column_ref(side) {
                        out.push(Predicate {
                            qualifier,
                            column,
                            kind: PredicateKind::Equality
                        });
                    }
                }
            }
            _ => {}
        },
        Expr::Nested(inner) => collect_join_columns(inner, out),
        _ => {}
    }
}

fn push_comparison(
    left: &Expr,
    right: &Expr,
    kind: PredicateKind,
    out: &mut Vec<Predicate>
) {
    for side in [left, right] {
        if let Some((qualifier, column)) = column_ref(side) {
            out.push(Predicate {
                qualifier,
                column,
                kind
            });
        }
    }
}

/// Resolve an expression to `(qualifier, column)` when it is a bare column
/// reference.
fn column_ref(expr: &Expr) -> Option<(Option<CompactString>, CompactString)> {
    match expr {
        Expr::Identifier(ident) => Some((None, ident.value.as_str().into())),
        Expr::CompoundIdentifier(idents) => {
            let column = idents.last()?.value.as_str().into();
            let qualifier = if idents.len() > 1 {
                idents.first().map(|q| q.value.as_str().into())
            } else {
                None
            };
            Some((qualifier, column))
        }
        Expr::Nested(inner) => column_ref(inner),
        _ => None
    }
}

fn clean_name(raw: &str) -> CompactString {
    raw.trim_matches('`').trim_matches('"').into()
}
