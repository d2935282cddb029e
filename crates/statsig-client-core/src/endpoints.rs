// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default endpoints and query parameter names.

/// Default API base URLs.
pub struct NetworkDefault;

impl NetworkDefault {
	pub const EVENTS_API: &'static str = "https://prodregistryv2.org/v1";
	pub const INITIALIZE_API: &'static str = "https://featureassets.org/v1";
	pub const SPECS_API: &'static str = "https://assetsconfigcdn.org/v1";
}

/// Query parameters attached to outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkParam {
	EventCount,
	SdkKey,
	SdkType,
	SdkVersion,
	Time,
	SessionId,
	StatsigEncoded,
}

impl NetworkParam {
	/// Parameters that every request carries and callers cannot override.
	pub const RESERVED: [NetworkParam; 5] = [
		NetworkParam::SdkKey,
		NetworkParam::SdkType,
		NetworkParam::SdkVersion,
		NetworkParam::Time,
		NetworkParam::SessionId,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			NetworkParam::EventCount => "ec",
			NetworkParam::SdkKey => "k",
			NetworkParam::SdkType => "st",
			NetworkParam::SdkVersion => "sv",
			NetworkParam::Time => "t",
			NetworkParam::SessionId => "sid",
			NetworkParam::StatsigEncoded => "se",
		}
	}

	pub fn is_reserved(name: &str) -> bool {
		Self::RESERVED.iter().any(|p| p.as_str() == name)
	}
}

impl std::fmt::Display for NetworkParam {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Well-known endpoints relative to an API base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
	Initialize,
	Rgstr,
}

impl Endpoint {
	pub fn path(&self) -> &'static str {
		match self {
			Endpoint::Initialize => "initialize",
			Endpoint::Rgstr => "rgstr",
		}
	}

	/// Joins the endpoint path onto `api`, tolerating a trailing slash.
	pub fn url(&self, api: &str) -> String {
		format!("{}/{}", api.trim_end_matches('/'), self.path())
	}
}
