//! Caching front for a [`Transport`].
//!
//! The proxy owns the only copy of the device's variable set. Every read first
//! makes sure the copy is fresh; refreshes go through a single async lock so
//! that a burst of concurrent reads costs one round-trip to the controller.
//! Temperatures leave the proxy in the configured [`DisplayUnit`].

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, trace, Level};

use crate::client::{Transport, UponorClient};
use crate::config::Config;
use crate::types::*;
use crate::vars::Variables;
use crate::Result;

pub const DEFAULT_EXPIRATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing fetched yet.
    Uninitialized,
    Fresh,
    /// Older than the expiration window, or invalidated.
    Stale,
    /// A refresh currently holds the lock.
    Refreshing,
}

#[derive(Debug, Default)]
struct RefreshState {
    refreshed_at: Option<Instant>,
    invalidated: bool,
}

pub struct UponorProxy<T: Transport = UponorClient> {
    transport: T,
    display_unit: DisplayUnit,
    expiration: Duration,
    refresh: Mutex<RefreshState>,
    snapshot: RwLock<Variables>,
}

impl UponorProxy<UponorClient> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = UponorClient::builder(&config.host)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::new(client, config.display_unit).with_expiration(config.cache_expiration))
    }
}

impl<T: Transport> UponorProxy<T> {
    pub fn new(transport: T, display_unit: DisplayUnit) -> Self {
        Self {
            transport,
            display_unit,
            expiration: DEFAULT_EXPIRATION,
            refresh: Mutex::new(RefreshState::default()),
            snapshot: RwLock::new(Variables::empty()),
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn display_unit(&self) -> DisplayUnit {
        self.display_unit
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -- cache --

    pub fn cache_state(&self) -> CacheState {
        let Ok(state) = self.refresh.try_lock() else {
            return CacheState::Refreshing;
        };
        match state.refreshed_at {
            None => CacheState::Uninitialized,
            Some(_) if state.invalidated => CacheState::Stale,
            Some(at) if at.elapsed() >= self.expiration => CacheState::Stale,
            Some(_) => CacheState::Fresh,
        }
    }

    /// Mark the snapshot stale so the next read refetches.
    pub async fn invalidate(&self) {
        self.refresh.lock().await.invalidated = true;
    }

    /// Refetch unless the snapshot is younger than the expiration window.
    /// Callers arriving during a refresh wait for it and reuse its result.
    pub async fn update_data(&self) {
        let mut state = self.refresh.lock().await;
        if !state.invalidated
            && let Some(at) = state.refreshed_at
            && at.elapsed() < self.expiration
        {
            trace!("snapshot fresh, skipping refresh");
            return;
        }
        self.refetch(&mut state).await;
    }

    async fn force_refresh(&self) {
        let mut state = self.refresh.lock().await;
        self.refetch(&mut state).await;
    }

    async fn refetch(&self, state: &mut RefreshState) {
        let vars = self.transport.get_data().await;
        self.with_snapshot_mut(|snapshot| {
            if tracing::enabled!(Level::DEBUG) {
                let changed = snapshot.diff(&vars).len();
                debug!(vars = vars.len(), changed, "refreshed snapshot");
            }
            *snapshot = vars;
        });
        state.refreshed_at = Some(Instant::now());
        state.invalidated = false;
    }

    fn with_snapshot<R>(&self, f: impl FnOnce(&Variables) -> R) -> R {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn with_snapshot_mut<R>(&self, f: impl FnOnce(&mut Variables) -> R) -> R {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    async fn read<R>(&self, f: impl FnOnce(&Variables) -> R) -> R {
        self.update_data().await;
        self.with_snapshot(f)
    }

    fn display(&self, celsius: Decimal) -> Decimal {
        self.display_unit.from_celsius(celsius)
    }

    // -- reads --

    pub async fn devices(&self) -> Vec<Device> {
        self.read(|vars| {
            vars.device_codes()
                .into_iter()
                .map(|code| self.decode_device(vars, code))
                .collect()
        })
        .await
    }

    fn decode_device(&self, vars: &Variables, code: String) -> Device {
        let is_on = vars.is_on(&code);
        Device {
            id: vars.id(&code).map(str::to_string),
            name: vars.name(&code).to_string(),
            model: vars.model().to_string(),
            version: vars.version(&code).map(str::to_string),
            is_on,
            is_eco_enabled: vars.is_eco_enabled(&code),
            current_hvac_mode: DeviceState::from_flags(is_on, vars.is_cooling_enabled()),
            current_temperature: self.display(vars.current_temperature(&code)),
            target_temperature: self.display(vars.target_temperature(&code)),
            min_limit_temperature: self.display(vars.min_limit(&code)),
            max_limit_temperature: self.display(vars.max_limit(&code)),
            current_humidity: vars.humidity(&code),
            code,
        }
    }

    pub async fn cooling_mode(&self) -> CoolingMode {
        self.read(|vars| CoolingMode {
            model: vars.model().to_string(),
            is_cooling_enabled: vars.is_cooling_enabled(),
        })
        .await
    }

    pub async fn away_mode(&self) -> AwayMode {
        self.read(|vars| AwayMode {
            model: vars.model().to_string(),
            is_away_enabled: vars.is_away_enabled(),
        })
        .await
    }

    pub async fn current_heating_cooling_state(&self, code: &str) -> DeviceState {
        self.read(|vars| DeviceState::from_flags(vars.is_on(code), vars.is_cooling_enabled()))
            .await
    }

    pub async fn current_temperature(&self, code: &str) -> Decimal {
        let celsius = self.read(|vars| vars.current_temperature(code)).await;
        self.display(celsius)
    }

    pub async fn target_temperature(&self, code: &str) -> Decimal {
        let celsius = self.read(|vars| vars.target_temperature(code)).await;
        self.display(celsius)
    }

    pub async fn humidity(&self, code: &str) -> Decimal {
        self.read(|vars| vars.humidity(code)).await
    }

    pub async fn name(&self, code: &str) -> String {
        self.read(|vars| vars.name(code).to_string()).await
    }

    pub async fn is_on(&self, code: &str) -> bool {
        self.read(|vars| vars.is_on(code)).await
    }

    pub async fn is_cooling_enabled(&self) -> bool {
        self.read(Variables::is_cooling_enabled).await
    }

    pub async fn is_away_enabled(&self) -> bool {
        self.read(Variables::is_away_enabled).await
    }

    pub async fn is_eco_enabled(&self, code: &str) -> bool {
        self.read(|vars| vars.is_eco_enabled(code)).await
    }

    /// Last known lower bound; never triggers a fetch.
    pub fn min_limit_temperature(&self, code: &str) -> Decimal {
        self.display(self.with_snapshot(|vars| vars.min_limit(code)))
    }

    /// Last known upper bound; never triggers a fetch.
    pub fn max_limit_temperature(&self, code: &str) -> Decimal {
        self.display(self.with_snapshot(|vars| vars.max_limit(code)))
    }

    // -- writes --

    /// `value` is in the display unit. The follow-up read reflects whatever the
    /// controller actually stored.
    pub async fn set_target_temperature(&self, code: &str, value: Decimal) {
        self.update_data().await;
        let celsius = self.display_unit.to_celsius(value);
        let payload = self.with_snapshot_mut(|vars| {
            vars.set_target_temperature(code, celsius);
            vars.to_set_target_temperature_payload(code)
        });
        debug!(code, %celsius, "setting target temperature");
        self.transport.set_data(&payload).await;
        self.force_refresh().await;
    }

    pub async fn set_cooling_mode(&self, enabled: bool) {
        self.update_data().await;
        let payload = self.with_snapshot_mut(|vars| {
            vars.set_cooling_mode(enabled);
            vars.to_set_cooling_mode_payload()
        });
        debug!(enabled, "setting cooling mode");
        self.transport.set_data(&payload).await;
        self.force_refresh().await;
    }

    pub async fn set_away_mode(&self, enabled: bool) {
        self.update_data().await;
        let payload = self.with_snapshot_mut(|vars| {
            vars.set_away_mode(enabled);
            vars.to_set_away_mode_payload()
        });
        debug!(enabled, "setting away mode");
        self.transport.set_data(&payload).await;
        self.force_refresh().await;
    }

    /// Swap a target parked on one limit to the other when a system mode flips:
    /// enabling moves min to max, disabling moves max to min. Returns whether
    /// the target was changed.
    pub async fn adjust_for_mode_change(&self, code: &str, enabling: bool) -> bool {
        let target = self.target_temperature(code).await;
        let (from, to) = if enabling {
            (self.min_limit_temperature(code), self.max_limit_temperature(code))
        } else {
            (self.max_limit_temperature(code), self.min_limit_temperature(code))
        };
        if target != from {
            return false;
        }
        info!(code, %from, %to, "adjusting target temperature for mode change");
        self.set_target_temperature(code, to).await;
        true
    }

    /// Set cooling mode after moving every thermostat's limit-parked target.
    pub async fn set_cooling_mode_adjusting(&self, enabled: bool) {
        for code in self.read(Variables::device_codes).await {
            self.adjust_for_mode_change(&code, enabled).await;
        }
        self.set_cooling_mode(enabled).await;
    }

    /// Set away mode after moving every thermostat's limit-parked target.
    pub async fn set_away_mode_adjusting(&self, enabled: bool) {
        for code in self.read(Variables::device_codes).await {
            self.adjust_for_mode_change(&code, enabled).await;
        }
        self.set_away_mode(enabled).await;
    }
}
