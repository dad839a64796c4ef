use super::context::{CycleSettings, TradingContext};
use super::report::{EvaluationCycle, OrderReport};
use crate::datasource::{position_size, Brokerage, BrokerageError, OrderRequest};
use crate::domain::{
    fills_for_symbol, into_chronological, Decimal, PriceSeries, Side, TimeInForce, TimeNs,
};
use crate::engine::{
    decide, evaluate_signals, rolling_bands, rolling_mean, Action, BandMultipliers,
    IndicatorError, Lot, LotLedger, SignalInputs, Signals,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("brokerage unavailable: {0}")]
    Brokerage(#[from] BrokerageError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

/// Runs evaluation cycles for one symbol against a brokerage.
///
/// Holds no ledger between cycles; lots are rebuilt from fill history each
/// time. The only carried state is the equity snapshot and a diagnostic
/// count of consecutive holds.
#[derive(Debug)]
pub struct Evaluator {
    brokerage: Arc<dyn Brokerage>,
    settings: CycleSettings,
    context: TradingContext,
    no_action_count: u64,
}

/// Outcome of applying the chosen action.
struct Applied {
    action: Action,
    rule: Option<&'static str>,
    order: Option<OrderReport>,
    position: Decimal,
}

impl Evaluator {
    pub fn new(brokerage: Arc<dyn Brokerage>, settings: CycleSettings, context: TradingContext) -> Self {
        Self {
            brokerage,
            settings,
            context,
            no_action_count: 0,
        }
    }

    /// Build an evaluator, reading equity from the brokerage once.
    pub async fn connect(
        brokerage: Arc<dyn Brokerage>,
        settings: CycleSettings,
    ) -> Result<Self, BrokerageError> {
        let context = TradingContext::load(brokerage.as_ref()).await?;
        Ok(Self::new(brokerage, settings, context))
    }

    pub fn context(&self) -> &TradingContext {
        &self.context
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub fn no_action_count(&self) -> u64 {
        self.no_action_count
    }

    /// Re-read equity from the brokerage. Cycles never do this on their own.
    pub async fn refresh_equity(&mut self) -> Result<Decimal, BrokerageError> {
        self.context = TradingContext::load(self.brokerage.as_ref()).await?;
        Ok(self.context.equity)
    }

    pub async fn evaluate_cycle(&mut self) -> Result<EvaluationCycle, CycleError> {
        self.evaluate_cycle_at(TimeNs::now()).await
    }

    /// Run one cycle as of `now`: fetch, rebuild lots, evaluate, act once.
    pub async fn evaluate_cycle_at(&mut self, now: TimeNs) -> Result<EvaluationCycle, CycleError> {
        let symbol = self.settings.symbol.clone();
        let strategy = self.settings.strategy.clone();

        let bars = self.fetch_bars(now).await?;
        let latest_close = match bars.latest_close() {
            Some(close) if bars.len() >= strategy.min_history => close,
            _ => {
                info!(
                    "Waiting for data: {} of {} bars for {}",
                    bars.len(),
                    strategy.min_history,
                    symbol
                );
                return Ok(EvaluationCycle::insufficient_history(
                    symbol,
                    now,
                    self.context.equity,
                    bars.len(),
                    strategy.min_history,
                    self.no_action_count,
                ));
            }
        };

        let fills = into_chronological(fills_for_symbol(self.brokerage.get_fills().await?, &symbol));
        let mut ledger = LotLedger::reconstruct(
            &fills,
            strategy.quantity_per_trade,
            now,
            strategy.stale_after_ms,
            Some(latest_close),
        );
        debug!(
            "Rebuilt ledger from {} fills: {} open lots, stale={}",
            fills.len(),
            ledger.open_lot_count(),
            ledger.is_stale()
        );

        let position = position_size(self.brokerage.as_ref(), &symbol).await?;
        let ask = self.brokerage.get_latest_quote(&symbol).await?.ask_price;

        let closes = bars.closes_f64();
        let fast_ma = rolling_mean(&closes, strategy.fast_window)?;
        let slow_ma = rolling_mean(&closes, strategy.slow_window)?;
        let bands = rolling_bands(
            &closes,
            strategy.band_window,
            BandMultipliers::symmetric(strategy.band_multiplier),
        )?;

        let signals = evaluate_signals(&SignalInputs {
            position,
            equity: self.context.equity,
            ask,
            fast_ma: &fast_ma,
            slow_ma: &slow_ma,
            bands: &bands,
            latest_close,
            last_lot_cost: ledger.most_recent_cost(latest_close),
            stale: ledger.is_stale(),
            quantity_per_trade: strategy.quantity_per_trade,
            profit_margin: strategy.profit_margin,
        });
        debug!("Signals for {}: {:?}", symbol, signals);

        let decision = decide(&signals, position);
        let applied = match decision.action {
            Action::Buy => self.buy(&mut ledger, latest_close, now).await?,
            Action::Sell => self.sell(&mut ledger, &signals, position, now).await?,
            Action::None => None,
        };
        let applied = match applied {
            Some(mut applied) => {
                applied.rule = decision.rule;
                applied
            }
            None => self.hold(position).await,
        };

        Ok(EvaluationCycle {
            symbol,
            evaluated_at: now,
            signals: Some(signals),
            action: applied.action,
            rule: applied.rule.map(str::to_string),
            order: applied.order,
            resulting_position: Some(applied.position),
            latest_close: Some(latest_close),
            ask: Some(ask),
            equity: self.context.equity,
            lots: ledger.cost_bases(),
            open_lot_count: ledger.open_lot_count(),
            stale: ledger.is_stale(),
            no_action_count: self.no_action_count,
            error: None,
        })
    }

    async fn fetch_bars(&self, now: TimeNs) -> Result<PriceSeries, BrokerageError> {
        let since = now.saturating_sub_ms(self.settings.bar_lookback_ms);
        let bars = self
            .brokerage
            .get_bars(&self.settings.symbol, &self.settings.bar_timeframe, since)
            .await?;
        Ok(PriceSeries::new(bars))
    }

    async fn submit(&self, side: Side, quantity: Decimal) -> Result<OrderReport, BrokerageError> {
        let request = OrderRequest {
            symbol: self.settings.symbol.clone(),
            quantity,
            side,
            time_in_force: TimeInForce::Gtc,
        };
        let ack = self.brokerage.submit_order(&request).await?;
        info!(
            "Submitted {} {} {} (order {}, status {})",
            side, quantity, request.symbol, ack.order_id, ack.status
        );
        Ok(OrderReport { request, ack })
    }

    /// Bounded wait for the brokerage to reflect a just-submitted order.
    async fn settle(&self) {
        let delay = self.settings.strategy.settlement_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    async fn buy(
        &mut self,
        ledger: &mut LotLedger,
        latest_close: Decimal,
        now: TimeNs,
    ) -> Result<Option<Applied>, BrokerageError> {
        let order = self
            .submit(Side::Buy, self.settings.strategy.quantity_per_trade)
            .await?;
        self.settle().await;

        let lot_price = self
            .fetch_bars(now)
            .await?
            .latest_close()
            .unwrap_or(latest_close);
        ledger.open_lot(Lot::new(lot_price, now), now);
        self.no_action_count = 0;

        let position = position_size(self.brokerage.as_ref(), &self.settings.symbol).await?;
        Ok(Some(Applied {
            action: Action::Buy,
            rule: None,
            order: Some(order),
            position,
        }))
    }

    /// Sell one unit, or liquidate the whole position when less than two
    /// units are held. A zero-sized liquidation is not submitted.
    async fn sell(
        &mut self,
        ledger: &mut LotLedger,
        signals: &Signals,
        position: Decimal,
        now: TimeNs,
    ) -> Result<Option<Applied>, BrokerageError> {
        let quantity = if signals.can_sell {
            self.settings.strategy.quantity_per_trade
        } else {
            position
        };
        if !quantity.is_positive() {
            warn!(
                "Sell selected for {} but position is {}; holding instead",
                self.settings.symbol, position
            );
            return Ok(None);
        }

        let order = self.submit(Side::Sell, quantity).await?;
        ledger.close_most_recent(now);
        self.settle().await;

        let position = position_size(self.brokerage.as_ref(), &self.settings.symbol).await?;
        Ok(Some(Applied {
            action: Action::Sell,
            rule: None,
            order: Some(order),
            position,
        }))
    }

    async fn hold(&mut self, position: Decimal) -> Applied {
        self.no_action_count += 1;
        debug!(
            "Holding {} ({} consecutive)",
            self.settings.symbol, self.no_action_count
        );
        let delay = self.settings.strategy.hold_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Applied {
            action: Action::None,
            rule: None,
            order: None,
            position,
        }
    }
}
