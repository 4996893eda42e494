/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod auth;
pub mod game;
pub mod pick;
pub mod player;
pub mod stats;
pub mod sys;
pub mod team;
pub mod user;
