use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::core::Aggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{AppliedCoupon, CartLine, Money, OrderStatus};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,
    pub user_id: Uuid,

    // Cart contents and totals
    pub status: OrderStatus,
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub total_amount: Money,
    pub coupon: Option<AppliedCoupon>,

    // Placement
    pub tracking_id: Option<Uuid>,
    pub placed_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub cancelled_reason: Option<String>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderAggregate {
    /// Open a fresh Pending order for a user.
    pub fn open(order_id: Uuid, user_id: Uuid) -> Result<(Self, OrderEvent), OrderError> {
        let event = OrderEvent::Opened(CartOpened {
            order_id,
            user_id,
            opened_at: Utc::now(),
        });

        let order = Self::apply_first_event(&event)?;
        Ok((order, event))
    }

    fn opened(e: &CartOpened) -> Self {
        Self {
            id: e.order_id,
            version: 0,
            user_id: e.user_id,
            status: OrderStatus::Pending,
            lines: Vec::new(),
            subtotal: Money::ZERO,
            discount: Money::ZERO,
            total_amount: Money::ZERO,
            coupon: None,
            tracking_id: None,
            placed_at: None,
            address: None,
            description: None,
            cancelled_reason: None,
            created_at: e.opened_at,
            updated_at: e.opened_at,
        }
    }

    pub fn line_for(&self, product_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Recompute subtotal, discount and total from the lines and attached coupon.
    ///
    /// Leaves the totals untouched when any amount overflows.
    pub fn recalculate_totals(&mut self) -> Result<(), OrderError> {
        let subtotal = Self::subtotal_of(self.id, &self.lines)?;
        let discount = self
            .coupon
            .as_ref()
            .map_or(Money::ZERO, |coupon| subtotal.percent(coupon.discount));
        let total_amount = subtotal
            .checked_sub(discount)
            .ok_or(OrderError::AmountOverflow(self.id))?;

        self.subtotal = subtotal;
        self.discount = discount;
        self.total_amount = total_amount;
        Ok(())
    }

    fn subtotal_of(order_id: Uuid, lines: &[CartLine]) -> Result<Money, OrderError> {
        lines.iter().try_fold(Money::ZERO, |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or(OrderError::AmountOverflow(order_id))
        })
    }

    /// Business rule: the subtotal must stay representable after adding `extra`
    fn ensure_subtotal_fits(&self, extra: Money) -> Result<(), OrderError> {
        self.subtotal
            .checked_add(extra)
            .map(|_| ())
            .ok_or(OrderError::AmountOverflow(self.id))
    }

    /// Business rule: only Pending orders accept cart mutations
    fn ensure_pending(&self) -> Result<(), OrderError> {
        if self.status.is_pending() {
            Ok(())
        } else {
            Err(OrderError::NotPending(self.status))
        }
    }

    fn require_line(&self, product_id: Uuid) -> Result<&CartLine, OrderError> {
        self.line_for(product_id)
            .ok_or(OrderError::LineNotFound(product_id))
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Opened(e) => Ok(Self::opened(e)),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        self.updated_at = Utc::now();

        match event {
            OrderEvent::Opened(_) => {
                // First event already applied
            }
            OrderEvent::LineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            OrderEvent::QuantityChanged(e) => {
                let line = self
                    .lines
                    .iter_mut()
                    .find(|line| line.id == e.line_id)
                    .ok_or(OrderError::LineNotFound(e.product_id))?;
                line.quantity = e.quantity;
            }
            OrderEvent::LineRemoved(e) => {
                self.lines.retain(|line| line.id != e.line_id);
            }
            OrderEvent::CouponApplied(e) => {
                self.coupon = Some(e.coupon.clone());
            }
            OrderEvent::Placed(e) => {
                self.status = OrderStatus::Placed;
                self.tracking_id = Some(e.tracking_id);
                self.placed_at = Some(e.placed_at);
                self.address = e.address.clone();
                self.description = e.description.clone();
            }
            OrderEvent::Cancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_reason = e.reason.clone();
            }
        }

        self.recalculate_totals()
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::AddLine { line_id, product_id, unit_price } => {
                self.ensure_pending()?;

                if self.line_for(*product_id).is_some() {
                    return Err(OrderError::DuplicateLine(*product_id));
                }
                self.ensure_subtotal_fits(*unit_price)?;

                Ok(vec![OrderEvent::LineAdded(LineAdded {
                    line: CartLine {
                        id: *line_id,
                        order_id: self.id,
                        product_id: *product_id,
                        unit_price: *unit_price,
                        quantity: 1,
                        added_at: Utc::now(),
                    },
                })])
            }

            OrderCommand::IncreaseQuantity { product_id } => {
                self.ensure_pending()?;
                let line = self.require_line(*product_id)?;

                let quantity = line
                    .quantity
                    .checked_add(1)
                    .ok_or(OrderError::QuantityOverflow(*product_id))?;
                line.unit_price
                    .checked_times(quantity)
                    .ok_or(OrderError::AmountOverflow(self.id))?;
                self.ensure_subtotal_fits(line.unit_price)?;

                Ok(vec![OrderEvent::QuantityChanged(QuantityChanged {
                    line_id: line.id,
                    product_id: *product_id,
                    quantity,
                })])
            }

            OrderCommand::DecreaseQuantity { product_id } => {
                self.ensure_pending()?;
                let line = self.require_line(*product_id)?;

                // Going below one removes the line
                if line.quantity <= 1 {
                    return Ok(vec![OrderEvent::LineRemoved(LineRemoved {
                        line_id: line.id,
                        product_id: *product_id,
                    })]);
                }

                Ok(vec![OrderEvent::QuantityChanged(QuantityChanged {
                    line_id: line.id,
                    product_id: *product_id,
                    quantity: line.quantity - 1,
                })])
            }

            OrderCommand::ApplyCoupon { coupon } => {
                self.ensure_pending()?;

                Ok(vec![OrderEvent::CouponApplied(CouponApplied {
                    coupon: coupon.clone(),
                })])
            }

            OrderCommand::PlaceOrder { tracking_id, address, description } => {
                self.ensure_pending()?;

                if self.lines.is_empty() {
                    return Err(OrderError::EmptyCart);
                }

                Ok(vec![OrderEvent::Placed(OrderPlaced {
                    tracking_id: *tracking_id,
                    placed_at: Utc::now(),
                    address: address.clone(),
                    description: description.clone(),
                })])
            }

            OrderCommand::CancelOrder { reason } => {
                match self.status {
                    OrderStatus::Pending => {}
                    OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
                    OrderStatus::Placed => return Err(OrderError::NotPending(self.status)),
                }

                Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                    reason: reason.clone(),
                    cancelled_at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::DiscountPercent;

    fn pending_order() -> OrderAggregate {
        OrderAggregate::open(Uuid::new_v4(), Uuid::new_v4()).unwrap().0
    }

    fn add_line(order: &mut OrderAggregate, product_id: Uuid, price: i64) {
        order
            .execute(&OrderCommand::AddLine {
                line_id: Uuid::new_v4(),
                product_id,
                unit_price: Money::from_minor(price),
            })
            .unwrap();
    }

    fn coupon(pct: u8) -> AppliedCoupon {
        AppliedCoupon {
            code: format!("SAVE{pct}"),
            name: format!("{pct} percent off"),
            discount: DiscountPercent::new(pct).unwrap(),
        }
    }

    fn assert_totals_consistent(order: &OrderAggregate) {
        assert_eq!(order.total_amount, order.subtotal - order.discount);
    }

    #[test]
    fn test_open_creates_empty_pending_order() {
        let user_id = Uuid::new_v4();
        let (order, event) = OrderAggregate::open(Uuid::new_v4(), user_id).unwrap();

        assert_eq!(order.user_id, user_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.lines.is_empty());
        assert_eq!(order.total_amount, Money::ZERO);
        assert!(matches!(event, OrderEvent::Opened(_)));
        assert_eq!(order.aggregate_id(), order.id);
        assert_eq!(order.version(), 0);
    }

    #[test]
    fn test_apply_first_event_non_opened_fails() {
        let event = OrderEvent::LineRemoved(LineRemoved {
            line_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
        });

        let result = OrderAggregate::apply_first_event(&event);
        assert!(matches!(result.unwrap_err(), OrderError::NotInitialized));
    }

    #[test]
    fn test_add_line_updates_totals() {
        let mut order = pending_order();
        add_line(&mut order, Uuid::new_v4(), 120);
        add_line(&mut order, Uuid::new_v4(), 80);

        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.subtotal, Money::from_minor(200));
        assert_eq!(order.total_amount, Money::from_minor(200));
        assert_totals_consistent(&order);
    }

    #[test]
    fn test_add_duplicate_line_rejected() {
        let mut order = pending_order();
        let product_id = Uuid::new_v4();
        add_line(&mut order, product_id, 50);

        let result = order.handle_command(&OrderCommand::AddLine {
            line_id: Uuid::new_v4(),
            product_id,
            unit_price: Money::from_minor(50),
        });

        assert!(matches!(result.unwrap_err(), OrderError::DuplicateLine(id) if id == product_id));
        assert_eq!(order.lines.len(), 1);
    }

    #[test]
    fn test_coupon_discount_on_subtotal() {
        let mut order = pending_order();
        add_line(&mut order, Uuid::new_v4(), 200);

        order
            .execute(&OrderCommand::ApplyCoupon { coupon: coupon(10) })
            .unwrap();

        assert_eq!(order.discount, Money::from_minor(20));
        assert_eq!(order.total_amount, Money::from_minor(180));
    }

    #[test]
    fn test_reapplying_coupon_replaces_discount() {
        let mut order = pending_order();
        add_line(&mut order, Uuid::new_v4(), 200);

        order.execute(&OrderCommand::ApplyCoupon { coupon: coupon(10) }).unwrap();
        order.execute(&OrderCommand::ApplyCoupon { coupon: coupon(25) }).unwrap();

        assert_eq!(order.discount, Money::from_minor(50));
        assert_eq!(order.total_amount, Money::from_minor(150));
        assert_eq!(order.coupon.as_ref().unwrap().code, "SAVE25");
    }

    #[test]
    fn test_increase_quantity_with_coupon_recomputes_discount() {
        let mut order = pending_order();
        let product_id = Uuid::new_v4();
        add_line(&mut order, product_id, 50);
        order.execute(&OrderCommand::ApplyCoupon { coupon: coupon(20) }).unwrap();
        let before = order.total_amount;

        order
            .execute(&OrderCommand::IncreaseQuantity { product_id })
            .unwrap();

        assert_eq!(order.line_for(product_id).unwrap().quantity, 2);
        assert_eq!(order.subtotal, Money::from_minor(100));
        assert_eq!(order.total_amount - before, Money::from_minor(40));
        assert_totals_consistent(&order);
    }

    #[test]
    fn test_decrease_quantity_removes_line_at_one() {
        let mut order = pending_order();
        let product_id = Uuid::new_v4();
        add_line(&mut order, product_id, 50);
        order.execute(&OrderCommand::IncreaseQuantity { product_id }).unwrap();

        let events = order
            .execute(&OrderCommand::DecreaseQuantity { product_id })
            .unwrap();
        assert!(matches!(events[0], OrderEvent::QuantityChanged(ref e) if e.quantity == 1));

        let events = order
            .execute(&OrderCommand::DecreaseQuantity { product_id })
            .unwrap();
        assert!(matches!(events[0], OrderEvent::LineRemoved(_)));
        assert!(order.lines.is_empty());
        assert_eq!(order.subtotal, Money::ZERO);
        assert_totals_consistent(&order);
    }

    #[test]
    fn test_quantity_change_for_missing_line_fails() {
        let order = pending_order();
        let product_id = Uuid::new_v4();

        let result = order.handle_command(&OrderCommand::IncreaseQuantity { product_id });
        assert!(matches!(result.unwrap_err(), OrderError::LineNotFound(_)));

        let result = order.handle_command(&OrderCommand::DecreaseQuantity { product_id });
        assert!(matches!(result.unwrap_err(), OrderError::LineNotFound(_)));
    }

    #[test]
    fn test_place_order_assigns_tracking_and_closes_cart() {
        let mut order = pending_order();
        add_line(&mut order, Uuid::new_v4(), 10);
        let tracking_id = Uuid::new_v4();

        order
            .execute(&OrderCommand::PlaceOrder {
                tracking_id,
                address: Some("1 Main St".to_string()),
                description: None,
            })
            .unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.tracking_id, Some(tracking_id));
        assert!(order.placed_at.is_some());

        let result = order.handle_command(&OrderCommand::AddLine {
            line_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            unit_price: Money::from_minor(5),
        });
        assert!(matches!(result.unwrap_err(), OrderError::NotPending(OrderStatus::Placed)));
    }

    #[test]
    fn test_place_empty_cart_fails() {
        let order = pending_order();

        let result = order.handle_command(&OrderCommand::PlaceOrder {
            tracking_id: Uuid::new_v4(),
            address: None,
            description: None,
        });

        assert!(matches!(result.unwrap_err(), OrderError::EmptyCart));
    }

    #[test]
    fn test_cancel_transitions() {
        let mut order = pending_order();

        order
            .execute(&OrderCommand::CancelOrder { reason: Some("changed mind".to_string()) })
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancelled_reason.as_deref(), Some("changed mind"));

        let result = order.handle_command(&OrderCommand::CancelOrder { reason: None });
        assert!(matches!(result.unwrap_err(), OrderError::AlreadyCancelled));

        let result = order.handle_command(&OrderCommand::ApplyCoupon { coupon: coupon(5) });
        assert!(matches!(result.unwrap_err(), OrderError::NotPending(OrderStatus::Cancelled)));
    }

    #[test]
    fn test_placed_order_cannot_be_cancelled() {
        let mut order = pending_order();
        add_line(&mut order, Uuid::new_v4(), 10);
        order
            .execute(&OrderCommand::PlaceOrder {
                tracking_id: Uuid::new_v4(),
                address: None,
                description: None,
            })
            .unwrap();

        let result = order.handle_command(&OrderCommand::CancelOrder { reason: None });
        assert!(matches!(result.unwrap_err(), OrderError::NotPending(OrderStatus::Placed)));
    }

    #[test]
    fn test_increase_past_representable_total_is_rejected() {
        let mut order = pending_order();
        let product_id = Uuid::new_v4();
        add_line(&mut order, product_id, i64::MAX / 2 + 1);
        let before = order.clone();

        let result = order.execute(&OrderCommand::IncreaseQuantity { product_id });

        assert!(matches!(result.unwrap_err(), OrderError::AmountOverflow(id) if id == order.id));
        assert_eq!(order.line_for(product_id).unwrap().quantity, 1);
        assert_eq!(order.subtotal, before.subtotal);
        assert_eq!(order.total_amount, before.total_amount);
    }

    #[test]
    fn test_add_line_past_representable_subtotal_is_rejected() {
        let mut order = pending_order();
        add_line(&mut order, Uuid::new_v4(), i64::MAX - 10);

        let result = order.handle_command(&OrderCommand::AddLine {
            line_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            unit_price: Money::from_minor(11),
        });

        assert!(matches!(result.unwrap_err(), OrderError::AmountOverflow(_)));
        assert_eq!(order.lines.len(), 1);
    }

    #[test]
    fn test_recalculate_totals_keeps_previous_totals_on_overflow() {
        let mut order = pending_order();
        let product_id = Uuid::new_v4();
        add_line(&mut order, product_id, i64::MAX / 2 + 1);

        // Lines loaded from storage bypass command validation
        order.lines[0].quantity = 3;
        let result = order.recalculate_totals();

        assert!(matches!(result.unwrap_err(), OrderError::AmountOverflow(_)));
        assert_eq!(order.subtotal, Money::from_minor(i64::MAX / 2 + 1));
    }

    #[test]
    fn test_totals_independent_of_mutation_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut first = pending_order();
        add_line(&mut first, a, 30);
        first.execute(&OrderCommand::ApplyCoupon { coupon: coupon(10) }).unwrap();
        add_line(&mut first, b, 70);
        first.execute(&OrderCommand::IncreaseQuantity { product_id: a }).unwrap();

        let mut second = pending_order();
        add_line(&mut second, b, 70);
        add_line(&mut second, a, 30);
        second.execute(&OrderCommand::IncreaseQuantity { product_id: a }).unwrap();
        second.execute(&OrderCommand::ApplyCoupon { coupon: coupon(10) }).unwrap();

        assert_eq!(first.subtotal, second.subtotal);
        assert_eq!(first.discount, second.discount);
        assert_eq!(first.total_amount, second.total_amount);
    }
}
