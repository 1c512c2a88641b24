use super::clause::Clause;
use super::pattern::Pattern;
use super::{escape_label, escape_string, ToCypher};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
    Equal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
    Contains,
    StartsWith,
    EndsWith,
    RegexMatch,
    IsNull,
    IsNotNull,
    Add,
}

impl Operator {
    fn symbol(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Equal => "=",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::In => "IN",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS WITH",
            Operator::EndsWith => "ENDS WITH",
            Operator::RegexMatch => "=~",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Add => "+",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<CypherExpr>,
}

/// `EXISTS { MATCH <pattern> [<subqueries> WITH *] [WHERE <predicate>] }`
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsSubquery {
    pub pattern: Pattern,
    pub subqueries: Vec<Clause>,
    pub predicate: Option<CypherExpr>,
}

/// `<variable> { .a, b: <expr> }`
#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    pub variable: String,
    pub items: Vec<MapProjectionItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapProjectionItem {
    /// `.key`
    Property(String),
    /// `key: <expr>`
    Entry(String, CypherExpr),
}

/// `[<pattern> [WHERE <predicate>] | <projection>]`
#[derive(Debug, Clone, PartialEq)]
pub struct PatternComprehension {
    pub pattern: Pattern,
    pub predicate: Option<CypherExpr>,
    pub projection: CypherExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CypherExpr {
    Variable(String),
    Property { variable: String, key: String },
    Parameter(String),
    Literal(Literal),
    Raw(String),
    OperatorApplicationExp(OperatorApplication),
    FunctionCall { name: String, args: Vec<CypherExpr> },
    Exists(Box<ExistsSubquery>),
    /// `COUNT { ... }` over the same body as `Exists`
    Count(Box<ExistsSubquery>),
    PatternComprehension(Box<PatternComprehension>),
    /// `[<variable> IN <list> | <projection>]`
    ListComprehension {
        variable: String,
        list: Box<CypherExpr>,
        projection: Box<CypherExpr>,
    },
    List(Vec<CypherExpr>),
    Map(Vec<(String, CypherExpr)>),
    MapProjection(MapProjection),
    /// `<list>[<from>..<to>]`
    Slice {
        list: Box<CypherExpr>,
        from: Option<Box<CypherExpr>>,
        to: Option<Box<CypherExpr>>,
    },
}

impl CypherExpr {
    pub fn variable(name: impl Into<String>) -> Self {
        CypherExpr::Variable(name.into())
    }

    pub fn property(variable: impl Into<String>, key: impl Into<String>) -> Self {
        CypherExpr::Property {
            variable: variable.into(),
            key: key.into(),
        }
    }

    pub fn param(name: impl Into<String>) -> Self {
        CypherExpr::Parameter(name.into())
    }

    pub fn raw(text: impl Into<String>) -> Self {
        CypherExpr::Raw(text.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        CypherExpr::Literal(Literal::String(value.into()))
    }

    pub fn integer(value: i64) -> Self {
        CypherExpr::Literal(Literal::Integer(value))
    }

    pub fn function(name: impl Into<String>, args: Vec<CypherExpr>) -> Self {
        CypherExpr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn binary(operator: Operator, left: CypherExpr, right: CypherExpr) -> Self {
        CypherExpr::OperatorApplicationExp(OperatorApplication {
            operator,
            operands: vec![left, right],
        })
    }

    pub fn unary(operator: Operator, operand: CypherExpr) -> Self {
        CypherExpr::OperatorApplicationExp(OperatorApplication {
            operator,
            operands: vec![operand],
        })
    }

    pub fn not(operand: CypherExpr) -> Self {
        Self::unary(Operator::Not, operand)
    }

    pub fn eq(left: CypherExpr, right: CypherExpr) -> Self {
        Self::binary(Operator::Equal, left, right)
    }

    pub fn map(entries: Vec<(String, CypherExpr)>) -> Self {
        CypherExpr::Map(entries)
    }

    pub fn map_projection(variable: impl Into<String>, items: Vec<MapProjectionItem>) -> Self {
        CypherExpr::MapProjection(MapProjection {
            variable: variable.into(),
            items,
        })
    }

    pub fn slice(list: CypherExpr, from: Option<CypherExpr>, to: Option<CypherExpr>) -> Self {
        CypherExpr::Slice {
            list: Box::new(list),
            from: from.map(Box::new),
            to: to.map(Box::new),
        }
    }

    /// `a + b + ...`, or the single operand itself
    pub fn sum(mut operands: Vec<CypherExpr>) -> Option<CypherExpr> {
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(CypherExpr::OperatorApplicationExp(OperatorApplication {
                operator: Operator::Add,
                operands,
            })),
        }
    }

    /// Conjunction of the present predicates; `None` when nothing is left
    pub fn and(predicates: impl IntoIterator<Item = Option<CypherExpr>>) -> Option<CypherExpr> {
        Self::nary(Operator::And, predicates)
    }

    /// Disjunction of the present predicates; `None` when nothing is left
    pub fn or(predicates: impl IntoIterator<Item = Option<CypherExpr>>) -> Option<CypherExpr> {
        Self::nary(Operator::Or, predicates)
    }

    fn nary(
        operator: Operator,
        predicates: impl IntoIterator<Item = Option<CypherExpr>>,
    ) -> Option<CypherExpr> {
        let mut operands: Vec<CypherExpr> = predicates.into_iter().flatten().collect();
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(CypherExpr::OperatorApplicationExp(OperatorApplication {
                operator,
                operands,
            })),
        }
    }
}

impl ToCypher for Literal {
    fn to_cypher(&self) -> String {
        match self {
            Literal::Integer(i) => i.to_string(),
            Literal::String(s) => format!("\"{}\"", escape_string(s)),
        }
    }
}

impl ToCypher for OperatorApplication {
    fn to_cypher(&self) -> String {
        let rendered: Vec<String> = self.operands.iter().map(|o| o.to_cypher()).collect();
        match self.operator {
            Operator::And | Operator::Or => {
                let sep = format!(" {} ", self.operator.symbol());
                format!("({})", rendered.join(&sep))
            }
            Operator::Not => format!("NOT ({})", rendered.join(" ")),
            Operator::IsNull | Operator::IsNotNull => {
                format!("{} {}", rendered.join(" "), self.operator.symbol())
            }
            _ => rendered.join(&format!(" {} ", self.operator.symbol())),
        }
    }
}

impl ExistsSubquery {
    fn body(&self) -> String {
        let mut parts = vec![format!("MATCH {}", self.pattern.to_cypher())];
        if !self.subqueries.is_empty() {
            parts.extend(self.subqueries.iter().map(|c| c.to_cypher()));
            parts.push("WITH *".to_string());
        }
        if let Some(predicate) = &self.predicate {
            parts.push(format!("WHERE {}", predicate.to_cypher()));
        }
        parts.join(" ")
    }
}

impl ToCypher for ExistsSubquery {
    fn to_cypher(&self) -> String {
        format!("EXISTS {{ {} }}", self.body())
    }
}

impl ToCypher for MapProjection {
    fn to_cypher(&self) -> String {
        if self.items.is_empty() {
            return format!("{} {{ }}", self.variable);
        }
        let items: Vec<String> = self
            .items
            .iter()
            .map(|item| match item {
                MapProjectionItem::Property(key) => format!(".{}", escape_label(key)),
                MapProjectionItem::Entry(key, expr) => format!("{}: {}", key, expr.to_cypher()),
            })
            .collect();
        format!("{} {{ {} }}", self.variable, items.join(", "))
    }
}

impl ToCypher for PatternComprehension {
    fn to_cypher(&self) -> String {
        let predicate = self
            .predicate
            .as_ref()
            .map(|p| format!(" WHERE {}", p.to_cypher()))
            .unwrap_or_default();
        format!(
            "[{}{} | {}]",
            self.pattern.to_cypher(),
            predicate,
            self.projection.to_cypher()
        )
    }
}

impl ToCypher for CypherExpr {
    fn to_cypher(&self) -> String {
        match self {
            CypherExpr::Variable(name) => name.clone(),
            CypherExpr::Property { variable, key } => format!("{}.{}", variable, escape_label(key)),
            CypherExpr::Parameter(name) => format!("${}", name),
            CypherExpr::Literal(lit) => lit.to_cypher(),
            CypherExpr::Raw(raw) => raw.clone(),
            CypherExpr::OperatorApplicationExp(op) => op.to_cypher(),
            CypherExpr::FunctionCall { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_cypher()).collect();
                format!("{}({})", name, args.join(", "))
            }
            CypherExpr::Exists(exists) => exists.to_cypher(),
            CypherExpr::Count(count) => format!("COUNT {{ {} }}", count.body()),
            CypherExpr::PatternComprehension(comprehension) => comprehension.to_cypher(),
            CypherExpr::ListComprehension {
                variable,
                list,
                projection,
            } => format!(
                "[{} IN {} | {}]",
                variable,
                list.to_cypher(),
                projection.to_cypher()
            ),
            CypherExpr::List(items) => {
                let items: Vec<String> = items.iter().map(|i| i.to_cypher()).collect();
                format!("[{}]", items.join(", "))
            }
            CypherExpr::Map(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.to_cypher()))
                    .collect();
                format!("{{ {} }}", entries.join(", "))
            }
            CypherExpr::MapProjection(projection) => projection.to_cypher(),
            CypherExpr::Slice { list, from, to } => {
                let list = match list.as_ref() {
                    CypherExpr::OperatorApplicationExp(_) => format!("({})", list.to_cypher()),
                    other => other.to_cypher(),
                };
                format!(
                    "{}[{}..{}]",
                    list,
                    from.as_ref().map(|f| f.to_cypher()).unwrap_or_default(),
                    to.as_ref().map(|t| t.to_cypher()).unwrap_or_default()
                )
            }
        }
    }
}
