mod transmit;
