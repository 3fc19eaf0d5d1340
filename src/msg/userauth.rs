use bytes::Bytes;
use crate::codec::{PacketDecode, PacketEncode};
use crate::error::{Error, Result};

/// The method-specific part of `SSH_MSG_USERAUTH_REQUEST` (RFC 4252).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AuthMethod {
    /// The "none" method, used to probe which methods the server accepts (section 5.2).
    None,
    /// The "password" method (section 8).
    Password {
        password: String,
    },
    /// The "password" method with a password change (section 8).
    PasswordChange {
        old_password: String,
        new_password: String,
    },
    /// The "publickey" method (section 7). Without a signature this only asks the server whether
    /// the key would be acceptable.
    Pubkey {
        algo: String,
        key_blob: Bytes,
        signature: Option<Bytes>,
    },
    /// The "hostbased" method (section 9).
    Hostbased {
        algo: String,
        key_blob: Bytes,
        hostname: String,
        hostuser: String,
        signature: Bytes,
    },
}

impl AuthMethod {
    /// The method name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Password { .. } | AuthMethod::PasswordChange { .. } => "password",
            AuthMethod::Pubkey { .. } => "publickey",
            AuthMethod::Hostbased { .. } => "hostbased",
        }
    }

    pub(super) fn encode(&self, payload: &mut PacketEncode) {
        payload.put_str(self.name());
        match self {
            AuthMethod::None => {},
            AuthMethod::Password { password } => {
                payload.put_bool(false);
                payload.put_str(password);
            },
            AuthMethod::PasswordChange { old_password, new_password } => {
                payload.put_bool(true);
                payload.put_str(old_password);
                payload.put_str(new_password);
            },
            AuthMethod::Pubkey { algo, key_blob, signature } => {
                payload.put_bool(signature.is_some());
                payload.put_str(algo);
                payload.put_bytes(key_blob);
                if let Some(signature) = signature {
                    payload.put_bytes(signature);
                }
            },
            AuthMethod::Hostbased { algo, key_blob, hostname, hostuser, signature } => {
                payload.put_str(algo);
                payload.put_bytes(key_blob);
                payload.put_str(hostname);
                payload.put_str(hostuser);
                payload.put_bytes(signature);
            },
        }
    }

    pub(super) fn decode(payload: &mut PacketDecode) -> Result<AuthMethod> {
        let method = payload.get_string()?;
        match method.as_str() {
            "none" => Ok(AuthMethod::None),
            "password" => {
                if payload.get_bool()? {
                    Ok(AuthMethod::PasswordChange {
                        old_password: payload.get_string()?,
                        new_password: payload.get_string()?,
                    })
                } else {
                    Ok(AuthMethod::Password { password: payload.get_string()? })
                }
            },
            "publickey" => {
                let has_signature = payload.get_bool()?;
                let algo = payload.get_string()?;
                let key_blob = payload.get_bytes()?;
                let signature = if has_signature { Some(payload.get_bytes()?) } else { None };
                Ok(AuthMethod::Pubkey { algo, key_blob, signature })
            },
            "hostbased" => Ok(AuthMethod::Hostbased {
                algo: payload.get_string()?,
                key_blob: payload.get_bytes()?,
                hostname: payload.get_string()?,
                hostuser: payload.get_string()?,
                signature: payload.get_bytes()?,
            }),
            _ => {
                log::debug!("unknown authentication method {:?}", method);
                Err(Error::Malformed("unknown authentication method".into()))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::msg::Message;
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(AuthMethod::None.name(), "none");
        assert_eq!(AuthMethod::Password { password: "x".into() }.name(), "password");
        assert_eq!(
            AuthMethod::PasswordChange { old_password: "x".into(), new_password: "y".into() }.name(),
            "password");
    }

    #[test]
    fn test_decode_unknown_method() {
        let mut payload = PacketEncode::new();
        payload.put_u8(crate::codes::msg::USERAUTH_REQUEST);
        payload.put_str("alice");
        payload.put_str("ssh-connection");
        payload.put_str("keyboard-interactive");
        assert!(matches!(Message::decode(payload.finish()), Err(Error::Malformed(_))));
    }
}
