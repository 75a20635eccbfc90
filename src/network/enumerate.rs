// network/enumerate.rs
use super::types::{NetworkRange, NodeAddress, RangeError};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Number of members in the simulated consensus cluster.
pub const CLUSTER_SIZE: usize = 3;

fn next_address(addr: IpAddr) -> Option<IpAddr> {
    match addr {
        IpAddr::V4(v4) => u32::from(v4)
            .checked_add(1)
            .map(|n| IpAddr::V4(Ipv4Addr::from(n))),
        IpAddr::V6(v6) => u128::from(v6)
            .checked_add(1)
            .map(|n| IpAddr::V6(Ipv6Addr::from(n))),
    }
}

/// Derives `count` node addresses from `range`.
///
/// The address right after the base is left to whatever infrastructure shares
/// the segment (a container bridge, typically), so the first node gets
/// `base + 2`. Enumeration stops at the first address that leaves the range.
pub fn enumerate(range: &NetworkRange, count: usize) -> Result<Vec<NodeAddress>, RangeError> {
    let mut current = range.base();
    let mut skip_reserved = true;
    let mut addresses = Vec::with_capacity(count);

    while addresses.len() < count {
        current = next_address(current).ok_or(RangeError::AddressSpaceExhausted {
            last: current,
            range: *range,
        })?;

        if skip_reserved {
            skip_reserved = false;
            continue;
        }

        if !range.contains(&current) {
            return Err(RangeError::RangeExhausted {
                address: current,
                range: *range,
            });
        }
        addresses.push(current);
    }

    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(cidr: &str) -> NetworkRange {
        cidr.parse().unwrap()
    }

    fn addrs(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|a| a.parse().unwrap()).collect()
    }

    #[test]
    fn skips_base_and_reserved_address() {
        let nodes = enumerate(&range("10.0.0.0/24"), CLUSTER_SIZE).unwrap();
        assert_eq!(nodes, addrs(&["10.0.0.2", "10.0.0.3", "10.0.0.4"]));
    }

    #[test]
    fn addresses_are_increasing_and_contained() {
        for cidr in ["172.19.0.0/16", "192.168.7.0/29", "10.1.2.3/24", "fd00::/64"] {
            let net = range(cidr);
            let nodes = enumerate(&net, CLUSTER_SIZE).unwrap();
            assert_eq!(nodes.len(), CLUSTER_SIZE);
            assert!(nodes.windows(2).all(|w| w[0] < w[1]), "{cidr}");
            assert!(nodes.iter().all(|n| net.contains(n)), "{cidr}");

            let expected_first = next_address(next_address(net.base()).unwrap()).unwrap();
            assert_eq!(nodes[0], expected_first, "{cidr}");
        }
    }

    #[test]
    fn slash_30_fails_on_third_node() {
        let net = range("10.0.0.0/30");
        let err = enumerate(&net, CLUSTER_SIZE).unwrap_err();
        assert_eq!(
            err,
            RangeError::RangeExhausted {
                address: "10.0.0.4".parse().unwrap(),
                range: net,
            }
        );
        assert!(err.to_string().contains("10.0.0.4"));
        assert!(err.to_string().contains("10.0.0.0/30"));
    }

    #[test]
    fn reports_first_violation_only() {
        // .6 is reserved, .7 fits, .8 is the first address outside
        let net = range("10.0.0.5/29");
        let err = enumerate(&net, 5).unwrap_err();
        assert_eq!(
            err,
            RangeError::RangeExhausted {
                address: "10.0.0.8".parse().unwrap(),
                range: net,
            }
        );
    }

    #[test]
    fn single_host_range_fails_immediately() {
        let net = range("10.0.0.1/32");
        let err = enumerate(&net, CLUSTER_SIZE).unwrap_err();
        assert!(matches!(err, RangeError::RangeExhausted { address, .. }
            if address == "10.0.0.3".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn top_of_address_space_does_not_wrap() {
        let net = range("255.255.255.254/31");
        let err = enumerate(&net, CLUSTER_SIZE).unwrap_err();
        assert_eq!(
            err,
            RangeError::AddressSpaceExhausted {
                last: "255.255.255.255".parse().unwrap(),
                range: net,
            }
        );
    }

    #[test]
    fn enumeration_is_deterministic() {
        let net = range("172.19.0.0/16");
        assert_eq!(
            enumerate(&net, CLUSTER_SIZE).unwrap(),
            enumerate(&net, CLUSTER_SIZE).unwrap()
        );
    }
}
