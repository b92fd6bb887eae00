use crate::model::{Order, OrderStatus};

/// One status column of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn<'a> {
    pub status: OrderStatus,
    pub label: &'static str,
    pub orders: Vec<&'a Order>,
}

/// The board's five status columns, left to right.
///
/// Orders keep their incoming relative order inside a column. Orders with a
/// status the board does not know land in no column; they are kept aside in
/// [`BoardColumns::unplaced`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumns<'a> {
    columns: Vec<BoardColumn<'a>>,
    unplaced: Vec<&'a Order>,
}

impl<'a> BoardColumns<'a> {
    pub fn partition(orders: &'a [Order]) -> Self {
        let mut columns: Vec<BoardColumn<'a>> = OrderStatus::BOARD_ORDER
            .iter()
            .map(|status| BoardColumn {
                status: status.clone(),
                label: column_label(status).unwrap_or_default(),
                orders: Vec::new(),
            })
            .collect();
        let mut unplaced = Vec::new();

        for order in orders {
            match columns.iter_mut().find(|column| column.status == order.status) {
                Some(column) => column.orders.push(order),
                None => unplaced.push(order),
            }
        }
        Self { columns, unplaced }
    }

    pub fn columns(&self) -> &[BoardColumn<'a>] {
        &self.columns
    }

    pub fn column(&self, status: &OrderStatus) -> Option<&BoardColumn<'a>> {
        self.columns.iter().find(|column| &column.status == status)
    }

    /// Order count per column, in board order.
    pub fn counts(&self) -> Vec<usize> {
        self.columns.iter().map(|column| column.orders.len()).collect()
    }

    pub fn unplaced(&self) -> &[&'a Order] {
        &self.unplaced
    }
}

/// Column header for a status. `None` for statuses without a column.
pub fn column_label(status: &OrderStatus) -> Option<&'static str> {
    match status {
        OrderStatus::Pending => Some("Pendentes"),
        OrderStatus::Preparing => Some("Em Preparo"),
        OrderStatus::OutForDelivery => Some("A Caminho"),
        OrderStatus::Delivered => Some("Concluídos"),
        OrderStatus::Cancelled => Some("Cancelados"),
        OrderStatus::Unrecognized(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoreId;
    use rust_decimal_macros::dec;

    fn order(id: i64, status: OrderStatus) -> Order {
        Order::new(id, StoreId::new("s1"), dec!(10)).with_status(status)
    }

    #[test]
    fn test_partition_counts() {
        let orders = vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Pending),
            order(3, OrderStatus::Delivered),
            order(4, OrderStatus::Cancelled),
        ];
        let columns = BoardColumns::partition(&orders);

        assert_eq!(columns.counts(), vec![2, 0, 0, 1, 1]);
        let labels: Vec<&str> = columns.columns().iter().map(|c| c.label).collect();
        assert_eq!(
            labels,
            vec!["Pendentes", "Em Preparo", "A Caminho", "Concluídos", "Cancelados"]
        );
    }

    #[test]
    fn test_unknown_status_is_unplaced_and_order_is_kept() {
        let orders = vec![
            order(9, OrderStatus::Pending),
            order(8, OrderStatus::Unrecognized("on_hold".into())),
            order(7, OrderStatus::Pending),
        ];
        let columns = BoardColumns::partition(&orders);

        let pending: Vec<i64> = columns
            .column(&OrderStatus::Pending)
            .unwrap()
            .orders
            .iter()
            .map(|o| o.id.0)
            .collect();
        assert_eq!(pending, vec![9, 7]);
        assert_eq!(columns.unplaced().len(), 1);
        assert_eq!(columns.counts().iter().sum::<usize>(), 2);
    }
}
