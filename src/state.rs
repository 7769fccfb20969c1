// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthService, BearerExtractor};
use crate::clock::{Clock, SystemClock};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub clock: Arc<dyn Clock>,
    pub bearer: BearerExtractor,
}

impl AppState {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth: Arc::new(auth),
            clock: Arc::new(SystemClock),
            bearer: BearerExtractor::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_bearer_extractor(mut self, bearer: BearerExtractor) -> Self {
        self.bearer = bearer;
        self
    }
}
