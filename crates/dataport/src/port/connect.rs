// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection set-up and tear-down between two ports.

use super::direct::DirectLink;
use super::{endian_list, join, ConnectorProfile, InPort, OutPort};
use crate::cdr::{Endian, PortData};
use crate::config::keys;
use crate::connector::ConnectorInfo;
use crate::error::{Error, Result};
use std::sync::Arc;

/// First requested byte order both ports accept.
fn negotiate_endian(
    requested: &[Endian],
    outport: &[Endian],
    inport: &[Endian],
) -> Result<Endian> {
    requested
        .iter()
        .copied()
        .find(|e| outport.contains(e) && inport.contains(e))
        .ok_or_else(|| Error::EndianMismatch {
            outport: join(outport),
            inport: join(inport),
        })
}

/// Connect `outport` to `inport` and return the connection id.
///
/// Missing connection keys take their defaults (`push`, `flush`, `local`).
/// On failure nothing stays attached to either port.
///
/// # Errors
/// - [`Error::DuplicateConnector`] when the id is already used on a port
/// - [`Error::EndianMismatch`] when no requested byte order suits both ports
/// - [`Error::UnknownFactory`] for an unknown transport or publisher name
/// - [`Error::PublicationFailed`] / [`Error::SubscriptionFailed`] from the
///   transport, [`Error::InvalidConfig`] for bad properties
pub fn connect<T: PortData>(
    outport: &OutPort<T>,
    inport: &InPort<T>,
    mut profile: ConnectorProfile,
) -> Result<String> {
    if outport.is_connected(&profile.id) || inport.is_connected(&profile.id) {
        return Err(Error::DuplicateConnector(profile.id));
    }
    profile.fill_defaults();

    let requested = endian_list(&profile.properties)?;
    let endian = negotiate_endian(
        &requested,
        &outport.accepted_endians(),
        &inport.accepted_endians(),
    )?;
    profile
        .properties
        .set(keys::SERIALIZER_ENDIAN, endian.as_str());
    profile.properties.set(keys::DATA_TYPE, T::type_name());

    let ports = vec![outport.name().to_string(), inport.name().to_string()];
    let id = profile.id.clone();
    let interface = profile.interface();
    let dataflow = profile.dataflow();
    log::debug!(
        "connect {} -> {} [{}] {}/{} {}",
        ports[0],
        ports[1],
        id,
        interface,
        dataflow,
        endian
    );

    if interface == "direct" {
        let info = ConnectorInfo::new(&profile.name, &id, ports, profile.properties);
        let link = Arc::new(DirectLink::new(info, inport.direct_slot()));
        inport.attach_direct(Arc::clone(&link));
        outport.attach_direct(link);
        return Ok(id);
    }

    match dataflow.as_str() {
        "push" => {
            inport.publish_interfaces(&mut profile, &ports)?;
            if let Err(e) = outport.subscribe_interfaces(&profile, &ports) {
                let _ = inport.disconnect(&id);
                return Err(e);
            }
        }
        "pull" => {
            outport.publish_interfaces(&mut profile, &ports)?;
            if let Err(e) = inport.subscribe_interfaces(&profile, &ports) {
                let _ = outport.disconnect(&id);
                return Err(e);
            }
        }
        other => {
            return Err(Error::InvalidConfig(format!(
                "{} must be push or pull, got '{}'",
                keys::DATAFLOW_TYPE,
                other
            )))
        }
    }
    Ok(id)
}

/// Tear down connection `id` on both ports.
///
/// # Errors
/// [`Error::ConnectorNotFound`] when neither port knows the id.
pub fn disconnect<T: PortData>(outport: &OutPort<T>, inport: &InPort<T>, id: &str) -> Result<()> {
    let out = outport.disconnect(id);
    let inp = inport.disconnect(id);
    match (out, inp) {
        (Err(e), Err(_)) => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_follows_request_order() {
        let both = [Endian::Little, Endian::Big];
        assert_eq!(
            negotiate_endian(&[Endian::Big, Endian::Little], &both, &both).ok(),
            Some(Endian::Big)
        );
        assert_eq!(
            negotiate_endian(&both, &[Endian::Big], &both).ok(),
            Some(Endian::Big)
        );
        assert!(matches!(
            negotiate_endian(&both, &[Endian::Big], &[Endian::Little]),
            Err(Error::EndianMismatch { .. })
        ));
    }
}
