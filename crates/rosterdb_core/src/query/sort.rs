//! Result ordering.

use super::field::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order<F> {
    pub field: F,
    pub direction: Direction,
}

/// Ordered list of sort keys. Rendering always appends the entity id
/// ascending as the final tie-breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort<F> {
    orders: Vec<Order<F>>,
}

impl<F: Field> Default for Sort<F> {
    fn default() -> Self {
        Self::unsorted()
    }
}

impl<F: Field> Sort<F> {
    pub fn unsorted() -> Self {
        Self { orders: Vec::new() }
    }

    pub fn by(field: F, direction: Direction) -> Self {
        Self::unsorted().then(field, direction)
    }

    pub fn asc(field: F) -> Self {
        Self::by(field, Direction::Asc)
    }

    pub fn desc(field: F) -> Self {
        Self::by(field, Direction::Desc)
    }

    pub fn then(mut self, field: F, direction: Direction) -> Self {
        self.orders.push(Order { field, direction });
        self
    }

    pub fn orders(&self) -> &[Order<F>] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn requires_join(&self) -> bool {
        self.orders.iter().any(|order| order.field.requires_join())
    }

    pub(crate) fn to_order_by(&self, id_expr: &str) -> String {
        let mut keys: Vec<String> = self
            .orders
            .iter()
            .map(|order| format!("{} {}", order.field.expr(), order.direction.sql()))
            .collect();
        if !self.orders.iter().any(|order| order.field.expr() == id_expr) {
            keys.push(format!("{id_expr} ASC"));
        }
        format!(" ORDER BY {}", keys.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Sort};
    use crate::query::field::MemberField;

    #[test]
    fn unsorted_still_orders_by_id() {
        let sort = Sort::<MemberField>::unsorted();
        assert_eq!(sort.to_order_by("m.member_id"), " ORDER BY m.member_id ASC");
    }

    #[test]
    fn id_tie_breaker_is_appended_once() {
        let sort = Sort::desc(MemberField::Username).then(MemberField::Age, Direction::Asc);
        assert_eq!(
            sort.to_order_by("m.member_id"),
            " ORDER BY m.username DESC, m.age ASC, m.member_id ASC"
        );

        let by_id = Sort::desc(MemberField::Id);
        assert_eq!(by_id.to_order_by("m.member_id"), " ORDER BY m.member_id DESC");
    }
}
