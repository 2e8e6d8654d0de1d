use alloy::sol;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
);

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC721 {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

// Resolver implementing ERC-2381 on top of the plain address record.
sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface INftResolver {
        event AddrChanged(bytes32 indexed node, address a);
        event TokenIdChanged(bytes32 indexed node, uint256 tokenId);

        function addr(bytes32 node) external view returns (address payable);
        function setAddr(bytes32 node, address a) external;
        function tokenId(bytes32 node) external view returns (uint256);
        function setTokenId(bytes32 node, uint256 token) external;
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface INameResolver {
        event NameChanged(bytes32 indexed node, string name);

        function name(bytes32 node) external view returns (string memory);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ENS {
        event NewOwner(bytes32 indexed node, bytes32 indexed label, address owner);

        event Transfer(bytes32 indexed node, address owner);

        event NewResolver(bytes32 indexed node, address resolver);

        function setResolver(bytes32 node, address resolver) external;

        function owner(bytes32 node) external view returns (address);

        function resolver(bytes32 node) external view returns (address);

        function recordExists(bytes32 node) external view returns (bool);
    }
}
