//! Builder for `cast send` invocations run on the monitor node.

use std::fmt::Write as _;

/// Root-chain RPC as seen from the node running `cast`.
pub const ROOT_CHAIN_RPC: &str = "http://localhost:9545";

/// Wei per whole token (18 decimals).
pub const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// `amount` whole tokens in wei.
#[must_use]
pub const fn tokens(amount: u128) -> u128 {
    amount * WEI_PER_TOKEN
}

/// A contract call submitted with foundry's `cast send`.
#[derive(Clone, Debug)]
pub struct CastSend {
    contract: String,
    signature: String,
    args: Vec<String>,
    rpc_url: String,
    private_key: String,
}

impl CastSend {
    /// Call `signature` (e.g. `approve(address,uint256)`) on `contract`.
    pub fn new(contract: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            signature: signature.into(),
            args: Vec::new(),
            rpc_url: ROOT_CHAIN_RPC.to_string(),
            private_key: String::new(),
        }
    }

    /// Append a call argument.
    #[must_use]
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Override the RPC endpoint.
    #[must_use]
    pub fn rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Sign with this key.
    #[must_use]
    pub fn private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = private_key.into();
        self
    }

    /// Render the shell command.
    #[must_use]
    pub fn to_command(&self) -> String {
        let mut command = format!(
            "export PATH=\"$HOME/.foundry/bin:$PATH\" && cast send {} \"{}\"",
            self.contract, self.signature
        );
        for arg in &self.args {
            let _ = write!(command, " {arg}");
        }
        let _ = write!(command, " --rpc-url {}", self.rpc_url);
        if !self.private_key.is_empty() {
            let _ = write!(command, " --private-key {}", self.private_key);
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restake_command() {
        let command = CastSend::new("0x5e3e", "restakePOL(uint256,uint256,bool)")
            .arg(2)
            .arg(tokens(100))
            .arg(false)
            .private_key("0xkey")
            .to_command();

        assert_eq!(
            command,
            "export PATH=\"$HOME/.foundry/bin:$PATH\" && cast send 0x5e3e \
             \"restakePOL(uint256,uint256,bool)\" 2 100000000000000000000 false \
             --rpc-url http://localhost:9545 --private-key 0xkey"
        );
    }

    #[test]
    fn test_token_amounts() {
        assert_eq!(tokens(12).to_string(), "12000000000000000000");
        assert_eq!(tokens(0), 0);
    }
}
