/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::error::ErrorBody;
use rocket::serde::json::Json;

fn body(status: u16, error: &str) -> Json<ErrorBody> {
    Json(ErrorBody {
        status,
        error: error.to_owned(),
    })
}

#[catch(400)]
pub(crate) fn bad_request() -> Json<ErrorBody> {
    body(400, "bad request")
}

#[catch(401)]
pub(crate) fn not_authorized() -> Json<ErrorBody> {
    body(401, "not authorized")
}

#[catch(404)]
pub(crate) fn not_found() -> Json<ErrorBody> {
    body(404, "not found")
}

// Rocket raises 422 itself when a JSON body does not deserialize.
#[catch(422)]
pub(crate) fn unprocessable() -> Json<ErrorBody> {
    body(422, "request body or parameters failed validation")
}

#[catch(500)]
pub(crate) fn internal_error() -> Json<ErrorBody> {
    body(500, "internal server error")
}
