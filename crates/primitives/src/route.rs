//! Networks and the two-endpoint routes between them.
//!
//! A [`Route`] is only meaningful to a protocol instance whose own [`NetworkId`] is one of its
//! endpoints. Rather than checking membership ad hoc, every entry point asks the route which
//! [`RouteSide`] the local network is on and rejects the call if the answer is `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::PrimitiveError;

/// The identifier of a network connected by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u32);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NetworkId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// The side of a [`Route`] that a network is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteSide {
    /// The network where swaps are requested and operators are reimbursed.
    Source,

    /// The network where operators advance funds to the requester.
    Destination,
}

/// An ordered pair of distinct networks.
///
/// Serialized as a two-element array `[src, dst]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "[u32; 2]", try_from = "[u32; 2]")]
pub struct Route {
    src: NetworkId,
    dst: NetworkId,
}

impl Route {
    /// Creates a new route, rejecting routes whose endpoints coincide.
    pub fn new(
        src: impl Into<NetworkId>,
        dst: impl Into<NetworkId>,
    ) -> Result<Self, PrimitiveError> {
        let (src, dst) = (src.into(), dst.into());
        if src == dst {
            return Err(PrimitiveError::DegenerateRoute(src));
        }

        Ok(Self { src, dst })
    }

    /// The network where the swap originates.
    pub const fn src(&self) -> NetworkId {
        self.src
    }

    /// The network where the swap is fulfilled.
    pub const fn dst(&self) -> NetworkId {
        self.dst
    }

    /// Returns the side of this route that `network` is on, or `None` if the route does not touch
    /// `network` at all.
    pub fn side_of(&self, network: NetworkId) -> Option<RouteSide> {
        if network == self.src {
            Some(RouteSide::Source)
        } else if network == self.dst {
            Some(RouteSide::Destination)
        } else {
            None
        }
    }

    /// A compact identifier for the route used in events: `(src << 32) | dst`.
    pub const fn discriminant(&self) -> u64 {
        ((self.src.0 as u64) << 32) | self.dst.0 as u64
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

impl From<Route> for [u32; 2] {
    fn from(route: Route) -> Self {
        [route.src.0, route.dst.0]
    }
}

impl TryFrom<[u32; 2]> for Route {
    type Error = PrimitiveError;

    fn try_from([src, dst]: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(src, dst)
    }
}

#[cfg(feature = "arbitrary")]
impl proptest::arbitrary::Arbitrary for Route {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::strategy::Strategy;

        (0u32..8, 1u32..8)
            .prop_map(|(src, offset)| Route {
                src: NetworkId(src),
                dst: NetworkId((src + offset) % 8),
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn degenerate_route_is_rejected() {
        assert_eq!(
            Route::new(3u32, 3u32),
            Err(PrimitiveError::DegenerateRoute(NetworkId(3)))
        );
    }

    #[test]
    fn side_of_identifies_both_endpoints() {
        let route = Route::new(0u32, 1u32).unwrap();

        assert_eq!(route.side_of(NetworkId(0)), Some(RouteSide::Source));
        assert_eq!(route.side_of(NetworkId(1)), Some(RouteSide::Destination));
        assert_eq!(route.side_of(NetworkId(2)), None);
    }

    #[test]
    fn discriminant_packs_both_endpoints() {
        assert_eq!(Route::new(0u32, 1u32).unwrap().discriminant(), 1);
        assert_eq!(Route::new(1u32, 0u32).unwrap().discriminant(), 1 << 32);
    }

    #[test]
    fn serde_as_pair() {
        let route: Route = serde_json::from_str("[0, 1]").unwrap();
        assert_eq!(route, Route::new(0u32, 1u32).unwrap());
        assert_eq!(serde_json::to_string(&route).unwrap(), "[0,1]");

        assert!(serde_json::from_str::<Route>("[1, 1]").is_err());
    }

    proptest! {
        #[test]
        fn discriminant_is_injective(a in any::<(u32, u32)>(), b in any::<(u32, u32)>()) {
            prop_assume!(a.0 != a.1 && b.0 != b.1);

            let first = Route::new(a.0, a.1).unwrap();
            let second = Route::new(b.0, b.1).unwrap();

            prop_assert_eq!(first == second, first.discriminant() == second.discriminant());
        }
    }
}
