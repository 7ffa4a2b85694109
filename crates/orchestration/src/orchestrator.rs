//! Order lifecycle use cases.

use common::{AggregateId, IdGenerator, UuidV7Generator};
use domain::{
    Address, Aggregate, DomainError, Money, Order, OrderItem, OrderStatus, Payment,
    PaymentMethod, Shipment, ShipmentStatus, ShippingMethod,
};
use store::{OrderRepository, Page, PageRequest, PaymentRepository, ShipmentRepository};

use crate::error::{OrchestrationError, Result};
use crate::gateway::PaymentGateway;
use crate::locks::OrderLocks;

/// One requested line of a new order.
///
/// `quantity` is signed so that malformed requests reach the domain check
/// and fail with `InvalidQuantity` instead of being rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }
}

/// Coordinates orders, payments, shipments and the payment gateway.
///
/// Mutating use cases take a per-order lock for their whole
/// load → mutate → gateway → persist sequence, and the repositories reject
/// stale writes, so two concurrent payments for one order cannot both reach
/// the gateway.
pub struct OrderOrchestrator<O, P, S, G>
where
    O: OrderRepository,
    P: PaymentRepository,
    S: ShipmentRepository,
    G: PaymentGateway,
{
    orders: O,
    payments: P,
    shipments: S,
    gateway: G,
    ids: Box<dyn IdGenerator>,
    locks: OrderLocks,
}

impl<O, P, S, G> OrderOrchestrator<O, P, S, G>
where
    O: OrderRepository,
    P: PaymentRepository,
    S: ShipmentRepository,
    G: PaymentGateway,
{
    /// Creates a new orchestrator using UUID v7 identifiers.
    pub fn new(orders: O, payments: P, shipments: S, gateway: G) -> Self {
        Self {
            orders,
            payments,
            shipments,
            gateway,
            ids: Box::new(UuidV7Generator::new()),
            locks: OrderLocks::new(),
        }
    }

    /// Replaces the identifier generator.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Places a new pending order.
    ///
    /// Lines are converted in order and the first bad one aborts the whole
    /// request; nothing is persisted unless every line is valid.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_order(&self, user_id: &str, lines: Vec<OrderLine>) -> Result<Order> {
        let mut order = Order::create(self.ids.next_id(), user_id, self.ids.next_order_number())?;

        for line in lines {
            let quantity = u32::try_from(line.quantity)
                .ok()
                .filter(|quantity| *quantity > 0)
                .ok_or(DomainError::InvalidQuantity {
                    quantity: line.quantity,
                })?;
            let item = OrderItem::new(
                self.ids.next_id(),
                order.id(),
                line.product_id,
                line.product_name,
                quantity,
                line.unit_price,
            )?;
            order.add_item(item)?;
        }

        self.orders.create(&mut order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            order_number = order.order_number(),
            total = %order.total_amount(),
            "order created"
        );
        Ok(order)
    }

    /// Captures the order total through the gateway.
    ///
    /// A declined or failed capture is recorded as a failed payment and
    /// reported as `PaymentFailed`; the order stays pending so the customer
    /// can retry. On success the payment is persisted before the order is
    /// marked paid.
    #[tracing::instrument(skip(self))]
    pub async fn process_payment(
        &self,
        order_id: AggregateId,
        method: PaymentMethod,
    ) -> Result<Payment> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        require_status(&order, OrderStatus::Pending)?;
        if !order.has_items() || !order.total_amount().is_positive() {
            return Err(DomainError::EmptyOrder.into());
        }

        if let Some(existing) = self.payments.find_by_order_id(order_id).await?
            && existing.is_completed()
        {
            tracing::warn!(
                %order_id,
                payment_id = %existing.id(),
                "pending order already has a completed payment, reconciling instead of charging"
            );
            order.mark_as_paid()?;
            self.orders.update(&mut order).await?;
            return Ok(existing);
        }

        let mut payment =
            Payment::create(self.ids.next_id(), order_id, order.total_amount(), method)?;

        let started = std::time::Instant::now();
        let outcome = self.gateway.process_payment(&payment.amount(), method).await;
        metrics::histogram!("payment_duration_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Err(err) => {
                let reason = err.to_string();
                payment.mark_as_failed(reason.clone())?;
                self.payments.create(&mut payment).await?;

                metrics::counter!("payments_total", "outcome" => "failed").increment(1);
                tracing::warn!(%order_id, payment_id = %payment.id(), %reason, "payment failed");
                Err(DomainError::PaymentFailed { reason }.into())
            }
            Ok(receipt) => {
                payment.mark_as_completed(receipt.transaction_id, receipt.response)?;
                if let Err(err) = self.payments.create(&mut payment).await {
                    tracing::error!(
                        %order_id,
                        payment_id = %payment.id(),
                        transaction_id = payment.transaction_id().unwrap_or_default(),
                        amount = %payment.amount(),
                        error = %err,
                        "charge captured but payment record not stored"
                    );
                    return Err(err.into());
                }

                order.mark_as_paid()?;
                self.orders.update(&mut order).await?;

                metrics::counter!("payments_total", "outcome" => "completed").increment(1);
                tracing::info!(
                    %order_id,
                    payment_id = %payment.id(),
                    transaction_id = payment.transaction_id().unwrap_or_default(),
                    "payment completed"
                );
                Ok(payment)
            }
        }
    }

    /// Cancels the order.
    ///
    /// A paid order can be cancelled; its payment is left untouched and has
    /// to be refunded separately.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: AggregateId) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        let was_paid = order.status() == OrderStatus::Paid;
        order.cancel()?;
        self.orders.update(&mut order).await?;

        if was_paid {
            tracing::warn!(%order_id, "cancelled a paid order without refunding its payment");
        } else {
            tracing::info!(%order_id, "order cancelled");
        }
        Ok(order)
    }

    /// Refunds the order's payment through the gateway, then marks the
    /// payment and the order refunded.
    #[tracing::instrument(skip(self))]
    pub async fn refund_payment(&self, order_id: AggregateId) -> Result<Payment> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        if !order.status().can_refund() {
            return Err(DomainError::InvalidOrderStatus {
                order_id,
                expected: "paid or completed",
                actual: order.status(),
            }
            .into());
        }

        let mut payment = self
            .payments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("payment", order_id))?;

        let cannot_refund = || DomainError::CannotRefund {
            payment_id: payment.id(),
            status: payment.status(),
        };
        if !payment.can_be_refunded() {
            return Err(cannot_refund().into());
        }
        let transaction_id = payment
            .transaction_id()
            .map(str::to_owned)
            .ok_or_else(cannot_refund)?;

        self.gateway
            .refund_payment(&transaction_id, &payment.amount())
            .await?;

        payment.refund()?;
        self.payments.update(&mut payment).await?;

        order.refund()?;
        self.orders.update(&mut order).await?;

        metrics::counter!("refunds_total").increment(1);
        tracing::info!(%order_id, payment_id = %payment.id(), %transaction_id, "payment refunded");
        Ok(payment)
    }

    /// Creates a pending shipment for a paid order.
    #[tracing::instrument(skip(self, address))]
    pub async fn create_shipment(
        &self,
        order_id: AggregateId,
        address: Address,
        method: ShippingMethod,
    ) -> Result<Shipment> {
        let _guard = self.locks.acquire(order_id).await;
        let order = self.load_order(order_id).await?;
        require_status(&order, OrderStatus::Paid)?;

        if let Some(existing) = self.shipments.find_by_order_id(order_id).await?
            && existing.status() != ShipmentStatus::Cancelled
        {
            return Err(OrchestrationError::ShipmentAlreadyExists {
                order_id,
                shipment_id: existing.id(),
            });
        }

        let mut shipment = Shipment::create(self.ids.next_id(), order_id, address, method)?;
        let estimated = shipment
            .shipping_method()
            .estimated_delivery(shipment.created_at());
        shipment.set_estimated_delivery_date(estimated);
        self.shipments.create(&mut shipment).await?;

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(
            %order_id,
            shipment_id = %shipment.id(),
            method = %shipment.shipping_method(),
            "shipment created"
        );
        Ok(shipment)
    }

    /// Hands the shipment to a carrier and completes its order.
    ///
    /// The order must be paid; this is checked before anything is written.
    /// A pending shipment is moved to processing first.
    #[tracing::instrument(skip(self))]
    pub async fn update_shipment(
        &self,
        shipment_id: AggregateId,
        tracking_number: &str,
        carrier: &str,
    ) -> Result<Shipment> {
        let order_id = self.load_shipment(shipment_id).await?.order_id();
        let _guard = self.locks.acquire(order_id).await;

        let mut shipment = self.load_shipment(shipment_id).await?;
        let mut order = self.load_order(order_id).await?;
        require_status(&order, OrderStatus::Paid)?;

        if shipment.status() == ShipmentStatus::Pending {
            shipment.start_processing()?;
        }
        shipment.ship(tracking_number, carrier)?;
        self.shipments.update(&mut shipment).await?;

        order.complete()?;
        self.orders.update(&mut order).await?;

        metrics::counter!("orders_completed_total").increment(1);
        tracing::info!(%order_id, %shipment_id, tracking_number, carrier, "shipment dispatched");
        Ok(shipment)
    }

    /// Marks a shipped shipment as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_delivery(&self, shipment_id: AggregateId) -> Result<Shipment> {
        let order_id = self.load_shipment(shipment_id).await?.order_id();
        let _guard = self.locks.acquire(order_id).await;

        let mut shipment = self.load_shipment(shipment_id).await?;
        shipment.deliver()?;
        self.shipments.update(&mut shipment).await?;

        tracing::info!(%order_id, %shipment_id, "shipment delivered");
        Ok(shipment)
    }

    /// Cancels a shipment that has not been delivered.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_shipment(&self, shipment_id: AggregateId) -> Result<Shipment> {
        let order_id = self.load_shipment(shipment_id).await?.order_id();
        let _guard = self.locks.acquire(order_id).await;

        let mut shipment = self.load_shipment(shipment_id).await?;
        shipment.cancel()?;
        self.shipments.update(&mut shipment).await?;

        tracing::info!(%order_id, %shipment_id, "shipment cancelled");
        Ok(shipment)
    }

    /// Repairs an order left pending after its payment completed.
    ///
    /// Returns true if the order was marked paid.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_order(&self, order_id: AggregateId) -> Result<bool> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        if order.status() != OrderStatus::Pending {
            return Ok(false);
        }
        let Some(payment) = self.payments.find_by_order_id(order_id).await? else {
            return Ok(false);
        };
        if !payment.is_completed() {
            return Ok(false);
        }

        order.mark_as_paid()?;
        self.orders.update(&mut order).await?;

        tracing::warn!(%order_id, payment_id = %payment.id(), "reconciled order to paid");
        Ok(true)
    }

    pub async fn get_order(&self, order_id: AggregateId) -> Result<Order> {
        self.load_order(order_id).await
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order> {
        self.orders
            .find_by_order_number(order_number)
            .await?
            .ok_or_else(|| DomainError::not_found("order", order_number).into())
    }

    /// Lists a user's orders one page at a time.
    pub async fn list_orders(&self, user_id: &str, request: PageRequest) -> Result<Page<Order>> {
        let (orders, total) = self
            .orders
            .list_by_user_id(user_id, request.offset(), request.limit())
            .await?;
        Ok(Page::new(orders, total, request))
    }

    /// Returns the latest payment attempt for the order.
    pub async fn get_payment(&self, order_id: AggregateId) -> Result<Payment> {
        self.payments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("payment", order_id).into())
    }

    /// Returns the latest shipment for the order.
    pub async fn get_shipment(&self, order_id: AggregateId) -> Result<Shipment> {
        self.shipments
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("shipment", order_id).into())
    }

    pub async fn get_shipment_by_tracking_number(&self, tracking_number: &str) -> Result<Shipment> {
        self.shipments
            .find_by_tracking_number(tracking_number)
            .await?
            .ok_or_else(|| DomainError::not_found("shipment", tracking_number).into())
    }

    async fn load_order(&self, order_id: AggregateId) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", order_id).into())
    }

    async fn load_shipment(&self, shipment_id: AggregateId) -> Result<Shipment> {
        self.shipments
            .find_by_id(shipment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("shipment", shipment_id).into())
    }
}

fn require_status(order: &Order, expected: OrderStatus) -> Result<()> {
    if order.status() != expected {
        return Err(DomainError::InvalidOrderStatus {
            order_id: order.id(),
            expected: expected.as_str(),
            actual: order.status(),
        }
        .into());
    }
    Ok(())
}
