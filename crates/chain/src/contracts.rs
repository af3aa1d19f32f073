use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    /// The strategy contract. Pulls the approved spend token from the caller and
    /// deploys it according to the simple strategy.
    #[sol(rpc)]
    interface IStrategyVault {
        function executeSimpleStrategy(uint256 amount) external;
    }
}
